use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

pub const DEFAULT_SEED_START: u32 = 0xC1C0_0001;

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => {
            u32::from_str_radix(&hex.replace('_', ""), 16).with_context(|| format!("invalid hex seed: {s}"))
        }
        None => s
            .replace('_', "")
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}")),
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_list(input: &str) -> Result<Vec<u32>> {
    let seeds = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// One seed per line; blank lines and `#` comments are skipped.
pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let seeds = data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

/// `count` seeds from an LCG walk starting at `start`.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    let mut seeds = Vec::with_capacity(count as usize);
    let mut current = start;
    for _ in 0..count {
        seeds.push(current);
        current = current.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    seeds
}

pub fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(list) = seeds {
        return parse_seed_list(list);
    }
    let start = match seed_start {
        Some(start) => parse_seed(start)?,
        None => DEFAULT_SEED_START,
    };
    Ok(seed_sequence(start, seed_count))
}

pub fn fnv1a_hex(bytes: &[u8]) -> String {
    let mut hash = 0xCBF2_9CE4_8422_2325u64;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    format!("{hash:016x}")
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(value).context("failed to serialize json")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_seeds() {
        assert_eq!(parse_seed("0xDEAD_BEEF").expect("hex"), 0xDEAD_BEEF);
        assert_eq!(parse_seed(" 42 ").expect("decimal"), 42);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
    }

    #[test]
    fn seed_list_skips_blanks() {
        assert_eq!(parse_seed_list("1, ,0x10,").expect("list"), vec![1, 16]);
        assert!(parse_seed_list(" , ").is_err());
    }

    #[test]
    fn seed_sequence_is_stable() {
        let seeds = seed_sequence(1, 3);
        assert_eq!(seeds[0], 1);
        assert_eq!(seeds[1], 1_664_525u32.wrapping_add(1_013_904_223));
        assert_eq!(seeds.len(), 3);
    }

    #[test]
    fn fnv_matches_reference_vector() {
        assert_eq!(fnv1a_hex(b""), "cbf29ce484222325");
        assert_eq!(fnv1a_hex(b"a"), "af63dc4c8601ec8c");
    }
}

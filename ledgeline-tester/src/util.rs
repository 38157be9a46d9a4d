use anyhow::{Context, Result, bail};
use ledgeline_gen::GeneratorConfig;
use std::path::Path;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens; decimal or `0x`-prefixed hex.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let parsed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16)
        } else {
            token.parse::<u64>()
        };
        match parsed {
            Ok(seed) => seeds.push(seed),
            Err(err) => bail!("invalid seed `{token}`: {err}"),
        }
    }
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}

/// Load a level file, or the bundled preset when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            GeneratorConfig::from_json(&json)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => GeneratorConfig::preset().context("failed to parse bundled preset")?,
    };
    config.validate().context("invalid level configuration")?;
    Ok(config)
}

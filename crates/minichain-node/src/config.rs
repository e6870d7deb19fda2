use crate::constants::{DEFAULT_ALLOWED_ORIGIN, DEFAULT_LISTEN};
use clap::Parser;
use minichain_core::{constants::DEFAULT_DIFFICULTY_BITS, MinerConfig};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "minichain-node")]
#[command(about = "HTTP node serving a single in-memory proof-of-work chain")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Leading zero bits the proof digest must have
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY_BITS)]
    pub difficulty: u32,

    /// Search proofs on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Abort a mine request after this many seconds
    #[arg(long)]
    pub mine_timeout_secs: Option<u64>,

    /// Origin allowed by CORS
    #[arg(long, default_value = DEFAULT_ALLOWED_ORIGIN)]
    pub allowed_origin: String,
}

impl Args {
    pub fn miner_config(&self) -> MinerConfig {
        MinerConfig {
            difficulty_bits: self.difficulty,
            parallel: self.parallel,
        }
    }

    pub fn mine_timeout(&self) -> Option<Duration> {
        self.mine_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["minichain-node"]).unwrap();
        assert_eq!(args.listen, "127.0.0.1:8080");
        assert_eq!(args.allowed_origin, "http://localhost:3000");
        assert_eq!(args.miner_config(), MinerConfig::default());
        assert!(args.mine_timeout().is_none());
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "minichain-node",
            "--listen",
            "0.0.0.0:9000",
            "--difficulty",
            "12",
            "--parallel",
            "--mine-timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(args.listen, "0.0.0.0:9000");
        assert_eq!(
            args.miner_config(),
            MinerConfig {
                difficulty_bits: 12,
                parallel: true
            }
        );
        assert_eq!(args.mine_timeout(), Some(Duration::from_secs(30)));
    }
}

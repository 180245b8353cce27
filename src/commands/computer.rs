//! `computer.*` - hardware information.

use serde::{Deserialize, Serialize};

use crate::api::types::ApiError;
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_GET_RAM_USAGE: &str = "computer.getRamUsage";

/// Physical memory figures in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamUsage {
    pub total: u64,
    pub available: u64,
}

#[derive(Debug, Deserialize)]
struct RamUsageResult {
    ram: RamUsage,
}

pub async fn get_ram_usage(dispatcher: &Dispatcher) -> Result<RamUsage, ApiError> {
    let result: RamUsageResult = dispatcher
        .call_typed(METHOD_GET_RAM_USAGE, serde_json::Value::Null)
        .await?;
    Ok(result.ram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHost;

    #[tokio::test]
    async fn test_get_ram_usage() {
        let host = MockHost::start();

        let ram = get_ram_usage(host.dispatcher()).await.unwrap();

        assert_eq!(
            ram,
            RamUsage {
                total: 16_384_000,
                available: 8_192_000,
            }
        );
        assert!(ram.available <= ram.total);
    }
}

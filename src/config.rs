use anyhow::Result;
use std::env;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Emulator,
    Testnet,
    Mainnet,
}

impl Network {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "emulator" => Ok(Network::Emulator),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(anyhow::anyhow!("unknown FLOW_NETWORK: {}", other)),
        }
    }

    fn default_access_node(self) -> &'static str {
        match self {
            Network::Emulator => "http://127.0.0.1:8888",
            Network::Testnet => "https://rest-testnet.onflow.org",
            Network::Mainnet => "https://rest-mainnet.onflow.org",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Emulator => "emulator",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        };
        f.write_str(name)
    }
}

/// Contract import addresses for the selected network, substituted into
/// Cadence script templates before execution.
#[derive(Debug, Clone)]
pub struct ContractAddresses {
    pub toucans: String,
    pub fungible_token: String,
    pub flow_token: String,
    pub fiat_token: String,
}

impl ContractAddresses {
    fn for_network(network: Network) -> Self {
        match network {
            Network::Emulator => ContractAddresses {
                toucans: "0xf8d6e0586b0a20c7".into(),
                fungible_token: "0xee82856bf20e2aa6".into(),
                flow_token: "0x0ae53cb6e3f42a79".into(),
                fiat_token: "0xf8d6e0586b0a20c7".into(),
            },
            Network::Testnet => ContractAddresses {
                toucans: "0x918c2008c16da416".into(),
                fungible_token: "0x9a0766d93b6608b7".into(),
                flow_token: "0x7e60df042a9c0868".into(),
                fiat_token: "0xa983fecbed621163".into(),
            },
            Network::Mainnet => ContractAddresses {
                toucans: "0x577a3c409c5dcb5e".into(),
                fungible_token: "0xf233dcee88fe0abe".into(),
                flow_token: "0x1654653399040a61".into(),
                fiat_token: "0xb19436aae4d94622".into(),
            },
        }
    }
}

/// Runtime configuration, loaded once in main and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    pub access_node: String,
    pub clickhouse_url: String,
    pub flow_price_url: String,
    pub token_info_url: String,
    pub api_port: u16,
    pub contracts: ContractAddresses,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let network = Network::parse(
            &env::var("FLOW_NETWORK").unwrap_or_else(|_| "mainnet".to_string()),
        )?;
        let access_node = env::var("FLOW_ACCESS_NODE")
            .unwrap_or_else(|_| network.default_access_node().to_string());
        let clickhouse_url =
            env::var("CLICKHOUSE_URL").unwrap_or_else(|_| "http://localhost:8123".to_string());
        let flow_price_url = env::var("FLOW_PRICE_URL")
            .unwrap_or_else(|_| "https://api.coinbase.com/v2/prices/FLOW-USD/spot".to_string());
        let token_info_url = env::var("TOKEN_INFO_URL")
            .unwrap_or_else(|_| "https://app.increment.fi/api/tokeninfo".to_string());
        let api_port = env::var("PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()?
            .unwrap_or(8000);

        Ok(Config {
            contracts: ContractAddresses::for_network(network),
            network,
            access_node,
            clickhouse_url,
            flow_price_url,
            token_info_url,
            api_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_parse_rejects_unknown() {
        assert!(Network::parse("devnet").is_err());
        assert_eq!(Network::parse("testnet").unwrap(), Network::Testnet);
    }

    #[test]
    fn mainnet_address_book() {
        let contracts = ContractAddresses::for_network(Network::Mainnet);
        assert_eq!(contracts.flow_token, "0x1654653399040a61");
        assert_eq!(contracts.fungible_token, "0xf233dcee88fe0abe");
    }
}

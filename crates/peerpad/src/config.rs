use std::path::PathBuf;

/// Fixed startup configuration for one site.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub site_id: String,
    pub host: String,
    pub port: u16,
    /// Static host:port list this node keeps dialing.
    pub peers: Vec<String>,
    /// When set, the visible text is exported to `site_<id>.txt` in this
    /// directory after every change.
    pub export_dir: Option<PathBuf>,
}

pub const USAGE: &str = "usage: peerpad --site-id <id> --port <port> \
[--host <host>] [--peers host:port,host:port] [--export]";

/// Parse argv (without the program name). Any violation is a startup
/// configuration error; the caller exits with code 1.
pub fn parse_args<I>(args: I) -> Result<NodeConfig, String>
where
    I: IntoIterator<Item = String>,
{
    let mut site_id = None;
    let mut host = "127.0.0.1".to_string();
    let mut port = None;
    let mut peers = Vec::new();
    let mut export = false;

    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--site-id" => {
                site_id = Some(required_value(&flag, args.next())?);
            }
            "--host" => {
                host = required_value(&flag, args.next())?;
            }
            "--port" => {
                let value = required_value(&flag, args.next())?;
                port = Some(
                    value
                        .parse::<u16>()
                        .map_err(|_| format!("invalid port: {value}"))?,
                );
            }
            "--peers" => {
                peers = parse_peer_list(&required_value(&flag, args.next())?)?;
            }
            "--export" => {
                export = true;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    let site_id = site_id.ok_or("missing required --site-id")?;
    if site_id.is_empty() {
        return Err("--site-id must not be empty".to_string());
    }
    let port = port.ok_or("missing required --port")?;

    Ok(NodeConfig {
        site_id,
        host,
        port,
        peers,
        export_dir: export.then(|| PathBuf::from(".")),
    })
}

fn required_value(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{flag} requires a value"))
}

/// Comma-separated host:port pairs; blank entries are skipped.
pub fn parse_peer_list(list: &str) -> Result<Vec<String>, String> {
    let mut peers = Vec::new();
    for entry in list.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (_, port) = entry
            .rsplit_once(':')
            .ok_or_else(|| format!("peer '{entry}' is not host:port"))?;
        port.parse::<u16>()
            .map_err(|_| format!("peer '{entry}' has an invalid port"))?;
        peers.push(entry.to_string());
    }
    Ok(peers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_args(args(&[
            "--site-id",
            "1",
            "--host",
            "0.0.0.0",
            "--port",
            "5001",
            "--peers",
            "127.0.0.1:5002, 127.0.0.1:5003",
            "--export",
        ]))
        .unwrap();

        assert_eq!(config.site_id, "1");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5001);
        assert_eq!(config.peers, vec!["127.0.0.1:5002", "127.0.0.1:5003"]);
        assert!(config.export_dir.is_some());
    }

    #[test]
    fn test_defaults() {
        let config = parse_args(args(&["--site-id", "a", "--port", "9000"])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.peers.is_empty());
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_missing_required_flags() {
        assert!(parse_args(args(&["--port", "9000"])).is_err());
        assert!(parse_args(args(&["--site-id", "1"])).is_err());
        assert!(parse_args(args(&["--site-id", "", "--port", "9000"])).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_args(args(&["--site-id", "1", "--port", "notaport"])).is_err());
        assert!(parse_args(args(&["--site-id", "1", "--port"])).is_err());
        assert!(parse_args(args(&["--wat"])).is_err());
    }

    #[test]
    fn test_peer_list_parsing() {
        assert_eq!(
            parse_peer_list("a:1,b:2,,").unwrap(),
            vec!["a:1".to_string(), "b:2".to_string()]
        );
        assert!(parse_peer_list("nocolon").is_err());
        assert!(parse_peer_list("host:99999").is_err());
    }
}

use std::future::Future;
use std::pin::Pin;

use domain::alias::error::AliasError;
use ports::secondary::pf_table_port::PfTablePort;
use tracing::debug;

use super::command;

/// Packet-filter tables driven through the `pfctl` binary.
pub struct PfctlTable {
    pfctl_path: String,
}

impl PfctlTable {
    pub fn new(pfctl_path: impl Into<String>) -> Self {
        Self {
            pfctl_path: pfctl_path.into(),
        }
    }

    async fn do_replace(&self, table: &str, address: &str) -> Result<(), AliasError> {
        command::run(&self.pfctl_path, &["-t", table, "-T", "replace", address]).await?;
        debug!(table, address, "packet-filter table replaced");
        Ok(())
    }

    async fn do_show(&self, table: &str) -> Result<Vec<String>, AliasError> {
        let output = command::run(&self.pfctl_path, &["-t", table, "-T", "show"]).await?;
        Ok(parse_show(&output))
    }
}

/// One entry per non-empty line, surrounding whitespace removed.
pub fn parse_show(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl PfTablePort for PfctlTable {
    fn replace_table<'a>(
        &'a self,
        table: &'a str,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AliasError>> + Send + 'a>> {
        Box::pin(self.do_replace(table, address))
    }

    fn show_table<'a>(
        &'a self,
        table: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AliasError>> + Send + 'a>> {
        Box::pin(self.do_show(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_show_trims_and_skips_blank_lines() {
        let out = "   10.0.0.0/24\n   192.168.1.1\n\n   2001:db8::/64\n";
        assert_eq!(
            parse_show(out),
            vec!["10.0.0.0/24", "192.168.1.1", "2001:db8::/64"]
        );
    }

    #[tokio::test]
    async fn show_passes_table_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("pfctl");
        std::fs::write(&script, "#!/bin/sh\necho \"  $2 $4\"\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let pf = PfctlTable::new(script.display().to_string());
        assert_eq!(pf.show_table("lan_net").await.unwrap(), vec!["lan_net show"]);
    }

    #[tokio::test]
    async fn failing_pfctl_is_fetch_error() {
        let pf = PfctlTable::new("/nonexistent/pfctl");
        let err = pf.replace_table("lan_net", "igb1:network").await.unwrap_err();
        assert!(matches!(err, AliasError::Fetch { .. }));
    }
}

use eyre::{
    Context as _,
    Result,
};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{
        Path,
        PathBuf,
    },
};

/// Where the metrics endpoint listens (`listen:` section).
#[derive(Clone, Debug, Deserialize)]
pub struct ListenConfig {
    pub address: String,
    #[serde(default)]
    pub cert_file: PathBuf,
    #[serde(default)]
    pub privkey_file: PathBuf,
}

impl ListenConfig {
    /// `:9921` is shorthand for listening on all interfaces.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let address = if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        };
        address
            .parse()
            .wrap_err_with(|| format!("invalid listen address {:?}", self.address))
    }

    /// Certificate and private key, only when both are configured.
    pub fn tls_files(&self) -> Option<(&Path, &Path)> {
        let set = |path: &Path| !path.as_os_str().is_empty();
        (set(&self.cert_file) && set(&self.privkey_file))
            .then(|| (self.cert_file.as_path(), self.privkey_file.as_path()))
    }
}

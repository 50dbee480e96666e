//! Prints the multi-version CRDs of every infrastructure kind as YAML.
//!
//! Usage: `crdgen > config/crd/bases.yaml`

use anyhow::Result;
use azure_crds::default_scheme;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let scheme = default_scheme().map_err(|e| anyhow::anyhow!("building scheme: {e}"))?;
    for crd in scheme.crds()? {
        info!(
            "Generated CRD {} ({} versions)",
            crd.metadata.name.as_deref().unwrap_or_default(),
            crd.spec.versions.len()
        );
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}

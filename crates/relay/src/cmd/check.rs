//! Check command - validate a configuration file and exit

use std::path::Path;

use anyhow::Result;

pub fn run(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        anyhow::bail!("no configuration file given (use --config)");
    };

    let config = crate::load_config(Some(path))?;
    println!(
        "{}: ok (listen {}, publisher {}, on_failure {:?})",
        path.display(),
        config.source.bind_address(),
        config.publisher.kind(),
        config.pipeline.on_failure,
    );
    Ok(())
}

use anyhow::Context;
use pine_intake_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing pine-intake in: {}", root.display());

    for dir in [paths::INTAKE_DIR, paths::SESSIONS_DIR] {
        let p = root.join(dir);
        let created =
            io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
        if created {
            println!("  created: {dir}/");
        }
    }

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let analysis_dir = root.join(&config.output.analysis_dir);
    io::ensure_dir(&analysis_dir)
        .with_context(|| format!("failed to create {}", analysis_dir.display()))?;
    println!("  ready:   {}", config.output.analysis_dir);

    Ok(())
}

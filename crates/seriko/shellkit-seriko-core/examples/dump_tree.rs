use std::path::PathBuf;

use anyhow::{bail, Context};
use shellkit_seriko::{hit_test, BindCatalog, Config, Seriko};
use shellkit_surface::{load_shell_dir, LoaderConfig};

/// Load a shell directory and print the layer tree of one surface as JSON.
///
/// Usage: dump_tree <shell-dir> [surface-id] [elapsed-ms] [x y]
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next().map(PathBuf::from) else {
        bail!("usage: dump_tree <shell-dir> [surface-id] [elapsed-ms] [x y]");
    };
    let surface: i32 = args.next().as_deref().unwrap_or("0").parse().context("surface id")?;
    let elapsed: i64 = args.next().as_deref().unwrap_or("0").parse().context("elapsed ms")?;

    let surfaces = load_shell_dir(&dir, &LoaderConfig::default())
        .with_context(|| format!("loading {}", dir.display()))?;
    for diag in surfaces.diagnostics() {
        eprintln!("warning: {diag}");
    }

    let descript = std::fs::read_to_string(dir.join("descript.txt")).unwrap_or_default();
    let catalog = BindCatalog::parse_descript(0, &descript);

    let mut seriko = Seriko::new(surfaces, Config::default());
    seriko.get_with_elapsed(surface, 0, &catalog);
    let tree = seriko.get_with_elapsed(surface, elapsed, &catalog);
    println!("{}", serde_json::to_string_pretty(&tree)?);

    if let (Some(x), Some(y)) = (args.next(), args.next()) {
        let (x, y): (i64, i64) = (x.parse().context("x")?, y.parse().context("y")?);
        let layers = seriko.get_collision_with_elapsed(surface, 0, &catalog);
        println!("hit ({x}, {y}): {:?}", hit_test(&layers, x, y));
    }
    Ok(())
}

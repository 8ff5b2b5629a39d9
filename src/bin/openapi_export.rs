use std::{fs, path::PathBuf};

use clap::Parser;

#[derive(Parser)]
#[command(name = "openapi-export", about = "Write the grocery-api OpenAPI document to disk", version)]
struct Cli {
    #[arg(long, default_value = "openapi", help = "Directory the document is written to")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = grocery_api::openapi::openapi_json()?;

    fs::create_dir_all(&cli.out_dir)?;

    let output_path = cli.out_dir.join("grocery-api.v1.json");
    fs::write(&output_path, json)?;

    println!("OpenAPI spec written to {}", output_path.display());
    Ok(())
}

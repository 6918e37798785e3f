use std::path::Path;
use std::process::Command;

use reel_storage::R2Client;
use reel_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();
    config.validate()?;

    println!(
        "reel-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.projects_dir()).await?;
    ensure_workdir(&config.scratch_dir()).await?;
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;

    if encoder_available(&config.hw_encoder)? {
        println!("reel-selfcheck: encoder {} available", config.hw_encoder);
    } else {
        println!(
            "reel-selfcheck: warning: encoder {} not listed by ffmpeg, load tests will fail",
            config.hw_encoder
        );
    }

    if std::env::var("SELFCHECK_STORAGE").is_ok() {
        ensure_env_present(&[
            "R2_ENDPOINT_URL",
            "R2_ACCESS_KEY_ID",
            "R2_SECRET_ACCESS_KEY",
            "R2_BUCKET_NAME",
            "R2_PUBLIC_URL",
        ])?;
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            println!("reel-selfcheck: rustls provider already installed");
        }
        let client = R2Client::from_env()?;
        client.check_connectivity().await?;
        println!("reel-selfcheck: bucket {} reachable", client.bucket());
    }

    println!("reel-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let output = Command::new(name)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            name,
            output.status
        ));
    }
    Ok(())
}

fn encoder_available(encoder: &str) -> anyhow::Result<bool> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
        .map_err(|e| anyhow::anyhow!("ffmpeg -encoders failed: {}", e))?;
    let listing = String::from_utf8_lossy(&output.stdout);
    Ok(listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(encoder)))
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}

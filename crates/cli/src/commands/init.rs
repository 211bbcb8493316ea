//! `raven init` — Write a starter config file.

use raven_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");

    if AppConfig::write_default(&config_path)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set OPENAI_API_KEY (or add api_key to the file)");
        println!("   2. Run: raven chat");
        println!("   3. For Discord, set DISCORD_TOKEN and run: raven run\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete it and re-run init.");
    }

    Ok(())
}

//! `raven ask` — One conversation turn.

use raven_config::Requirement;

pub async fn run(user: &str, name: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(Requirement::ApiKey)?;
    let dispatcher = super::build_dispatcher(&config)?;

    let reply = dispatcher.composer().respond(user, name, message).await;
    println!("{reply}");
    Ok(())
}

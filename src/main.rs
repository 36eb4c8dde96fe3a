// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Academy client binary
//!
//! A thin application root around the session layer: resolves the current
//! session, runs the interactive login flow, and prints learner
//! resources. Not a full CLI framework on purpose.

use academy_client::{config::Config, session::SessionProvider, AcademyClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(api = %config.api_base_url, "Starting Academy client");

    let client = AcademyClient::new(config)?;

    let command = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "status".to_string());

    match command.as_str() {
        "status" => show_status(&client).await?,
        "login" => login(&client).await?,
        "logout" => {
            client.controller.logout();
            println!("Signed out.");
        }
        "courses" => show_courses(&client).await?,
        "trivia" => show_trivia(&client).await?,
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: academy-client [status|login|logout|courses|trivia]");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Mount the session loop and report the resolved state.
async fn show_status(client: &AcademyClient) -> anyhow::Result<()> {
    let provider = SessionProvider::mount(client.controller.clone());

    let mut rx = provider.subscribe();
    let state = rx.wait_for(|s| !s.loading).await?.clone();

    match state.user {
        Some(user) => {
            println!(
                "Signed in as {} <{}>",
                user.name.as_deref().unwrap_or("(no name)"),
                user.email
            );
        }
        None => println!("Not signed in. Run `academy-client login` to sign in."),
    }

    Ok(())
}

/// Run the browser login flow end to end.
async fn login(client: &AcademyClient) -> anyhow::Result<()> {
    println!("Opening your browser to sign in...");
    let user = client.controller.login().await?;
    println!("Signed in as {}.", user.email);
    Ok(())
}

async fn show_courses(client: &AcademyClient) -> anyhow::Result<()> {
    let courses = client.catalog.list_courses().await?;

    if courses.is_empty() {
        println!("No courses published yet.");
        return Ok(());
    }

    for course in courses {
        println!(
            "#{:<4} {} ({} lessons)",
            course.id, course.title, course.lesson_count
        );
    }

    Ok(())
}

async fn show_trivia(client: &AcademyClient) -> anyhow::Result<()> {
    let entries = client.trivia.leaderboard().await?;

    if entries.is_empty() {
        println!("Leaderboard is empty.");
        return Ok(());
    }

    for (rank, entry) in entries.iter().enumerate() {
        println!("{:>3}. {:<24} {}", rank + 1, entry.name, entry.score);
    }

    Ok(())
}

/// Initialize logging; verbosity comes from `RUST_LOG`.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("academy_client=info".parse().unwrap()),
        )
        .with(format)
        .init();
}

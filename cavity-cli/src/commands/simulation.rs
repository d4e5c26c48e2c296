//! Simulation command handlers
//!
//! Handles submitting simulations, listing them, viewing details, and
//! following a run until it finishes.

use std::time::Duration;

use anyhow::{Result, bail};
use cavity_client::{ClientError, OrchestratorClient};
use cavity_core::domain::simulation::{Simulation, SimulationStatus};
use cavity_core::dto::simulation::CreateSimulation;
use clap::Args;
use colored::*;

/// Parameters for `cavity submit`
///
/// Unset parameters are omitted from the request so the orchestrator applies
/// its defaults.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Grid cells along x (10-200)
    #[arg(long)]
    nx: Option<u32>,

    /// Grid cells along y (10-200)
    #[arg(long)]
    ny: Option<u32>,

    /// Reynolds number (1-10000)
    #[arg(long = "re")]
    reynolds_number: Option<f64>,

    /// Time steps (10-5000)
    #[arg(long)]
    steps: Option<u32>,

    /// Time step size (0.0001-0.1)
    #[arg(long)]
    dt: Option<f64>,

    /// Lid velocity (-10 to 10)
    #[arg(long, allow_hyphen_values = true)]
    lid_velocity: Option<f64>,

    /// Wait for the simulation to finish
    #[arg(short, long)]
    wait: bool,

    /// Seconds between status checks while waiting
    #[arg(long, default_value_t = 2)]
    interval: u64,
}

impl SubmitArgs {
    fn request(&self) -> CreateSimulation {
        CreateSimulation {
            nx: self.nx,
            ny: self.ny,
            reynolds_number: self.reynolds_number,
            steps: self.steps,
            dt: self.dt,
            lid_velocity: self.lid_velocity,
        }
    }
}

/// Submit a simulation, optionally waiting for its outcome
pub async fn submit(client: &OrchestratorClient, args: SubmitArgs) -> Result<()> {
    let sim = match client.submit_simulation(&args.request()).await {
        Ok(sim) => sim,
        Err(ClientError::ApiError {
            message,
            field: Some(field),
            ..
        }) => bail!("Invalid value for {}: {}", field, message),
        Err(e) => return Err(e.into()),
    };

    println!("{}", "✓ Simulation submitted".green().bold());
    print_simulation_details(client, &sim);

    if args.wait {
        println!();
        let finished = follow(client, sim.id, args.interval).await?;
        return report_outcome(client, &finished);
    }

    Ok(())
}

/// List all simulations
pub async fn list(client: &OrchestratorClient) -> Result<()> {
    let sims = client.list_simulations().await?;

    if sims.is_empty() {
        println!("{}", "No simulations found.".yellow());
    } else {
        println!("{}", format!("Found {} simulation(s):", sims.len()).bold());
        println!();
        for sim in sims {
            print_simulation_summary(&sim);
        }
    }

    Ok(())
}

/// Get and display a single simulation
pub async fn get(client: &OrchestratorClient, id: i64) -> Result<()> {
    let sim = match client.get_simulation(id).await {
        Ok(sim) => sim,
        Err(e) if e.is_not_found() => bail!("Simulation {} not found", id),
        Err(e) => return Err(e.into()),
    };

    print_simulation_details(client, &sim);

    if let Some(diagnostics) = &sim.diagnostics {
        println!("\n{}", "Diagnostics:".bold());
        println!("{}", "─".repeat(80).dimmed());
        print!("{}", diagnostics);
        if !diagnostics.ends_with('\n') {
            println!();
        }
        println!("{}", "─".repeat(80).dimmed());
    }

    Ok(())
}

/// Follow a simulation until it reaches a terminal status
pub async fn watch(client: &OrchestratorClient, id: i64, interval: u64) -> Result<()> {
    let finished = follow(client, id, interval).await?;
    report_outcome(client, &finished)
}

/// Polls a simulation, printing each status change, until it finishes
async fn follow(client: &OrchestratorClient, id: i64, interval: u64) -> Result<Simulation> {
    let interval = Duration::from_secs(interval.max(1));
    let mut last: Option<SimulationStatus> = None;

    loop {
        let sim = client.get_simulation(id).await?;

        if last != Some(sim.status) {
            println!(
                "{} Simulation {} is {}",
                chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
                id,
                colorize_status(sim.status)
            );
            last = Some(sim.status);
        }

        if sim.is_terminal() {
            return Ok(sim);
        }

        tokio::time::sleep(interval).await;
    }
}

fn report_outcome(client: &OrchestratorClient, sim: &Simulation) -> Result<()> {
    match sim.status {
        SimulationStatus::Completed => {
            println!("{}", "✓ Simulation completed".green().bold());
            if let Some(url) = &sim.output_video_url {
                println!("  Video: {}", client.resolve_url(url).cyan());
            }
            Ok(())
        }
        _ => {
            if let Some(diagnostics) = &sim.diagnostics {
                println!("\n{}", "Diagnostics:".bold());
                println!("{}", diagnostics.red());
            }
            bail!("Simulation {} failed", sim.id)
        }
    }
}

/// Print a one-line simulation summary
fn print_simulation_summary(sim: &Simulation) {
    let c = &sim.config;
    println!(
        "  {} {:>6}  {:<9}  {}x{} Re={} steps={} dt={} lid={}",
        "•".cyan(),
        format!("#{}", sim.id).bold(),
        colorize_status(sim.status),
        c.nx,
        c.ny,
        c.reynolds_number,
        c.steps,
        c.dt,
        c.lid_velocity
    );
    println!(
        "           {}",
        sim.created_at
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
            .dimmed()
    );
}

/// Print detailed simulation information
fn print_simulation_details(client: &OrchestratorClient, sim: &Simulation) {
    let c = &sim.config;
    println!("{}", "Simulation Details:".bold());
    println!("  ID:               {}", sim.id.to_string().cyan());
    println!("  Status:           {}", colorize_status(sim.status));
    println!(
        "  Created:          {}",
        sim.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Grid:             {} x {}", c.nx, c.ny);
    println!("  Reynolds number:  {}", c.reynolds_number);
    println!("  Steps:            {}", c.steps);
    println!("  dt:               {}", c.dt);
    println!("  Lid velocity:     {}", c.lid_velocity);
    if let Some(url) = &sim.output_video_url {
        println!("  Video:            {}", client.resolve_url(url).cyan());
    }
}

/// Colorize simulation status for display
fn colorize_status(status: SimulationStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        SimulationStatus::Pending => status_str.yellow(),
        SimulationStatus::Running => status_str.cyan(),
        SimulationStatus::Completed => status_str.green(),
        SimulationStatus::Failed => status_str.red(),
    }
}

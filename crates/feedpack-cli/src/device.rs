//! `feedpack device` subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use feedpack_core::device::{Calibration, DeviceClient, NewSchedule};

#[derive(Args)]
pub struct DeviceArgs {
    /// Base URL of the feeder (overrides [device].url in the config)
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    op: DeviceOp,
}

#[derive(Subcommand)]
enum DeviceOp {
    /// Check that the feeder's API is up
    Status,
    /// List feeding schedules
    Schedules,
    /// Add a feeding schedule
    AddSchedule {
        /// Time of day, HH:MM
        time: String,
        /// Rotations per feed
        amount: u32,
    },
    /// Delete a feeding schedule
    DeleteSchedule {
        id: String,
    },
    /// Feed now
    Feed,
    /// Set the remaining food quantity
    SetQuantity {
        quantity: u32,
    },
    /// Show the current servo calibration
    Calibration,
    /// Nudge the servo duty cycle
    AdjustDuty {
        #[arg(allow_negative_numbers = true)]
        increment: i32,
    },
    /// Nudge the servo pulse duration
    AdjustDuration {
        #[arg(allow_negative_numbers = true)]
        increment: i32,
    },
    /// Run the servo once with the current calibration
    TestCalibration,
    /// Persist a calibration on the feeder
    SaveCalibration {
        duty_cycle: u32,
        pulse_duration: u32,
    },
}

pub fn run(args: DeviceArgs, configured_url: Option<&str>) -> Result<()> {
    let url = args
        .url
        .as_deref()
        .or(configured_url)
        .context("No device URL. Pass --url or set [device].url in feedpack.toml")?;
    let client = DeviceClient::new(url)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(dispatch(&client, args.op))
}

async fn dispatch(client: &DeviceClient, op: DeviceOp) -> Result<()> {
    match op {
        DeviceOp::Status => print_json(&client.status().await?),
        DeviceOp::Schedules => print_json(&client.schedules().await?),
        DeviceOp::AddSchedule { time, amount } => {
            let schedule = NewSchedule::new(time, amount)?;
            print_json(&client.add_schedule(&schedule).await?)
        }
        DeviceOp::DeleteSchedule { id } => print_json(&client.delete_schedule(&id).await?),
        DeviceOp::Feed => print_json(&client.feed().await?),
        DeviceOp::SetQuantity { quantity } => print_json(&client.set_quantity(quantity).await?),
        DeviceOp::Calibration => print_json(&client.calibration().await?),
        DeviceOp::AdjustDuty { increment } => print_json(&client.adjust_duty(increment).await?),
        DeviceOp::AdjustDuration { increment } => {
            print_json(&client.adjust_duration(increment).await?)
        }
        DeviceOp::TestCalibration => print_json(&client.test_calibration().await?),
        DeviceOp::SaveCalibration {
            duty_cycle,
            pulse_duration,
        } => print_json(
            &client
                .save_calibration(Calibration {
                    duty_cycle,
                    pulse_duration,
                })
                .await?,
        ),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

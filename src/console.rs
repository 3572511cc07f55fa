use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{bail, Context};
use wakeup_light::{settings, AlarmController, AlarmSettings, Preset};

const HELP: &str = "\
commands:
  status                          show light and alarm
  alarm on|off [HH:MM] [minutes]  set the alarm, keeping what is left out
  preset <label> | <label>        Off, 5%, 60% or Full
  level <0..1>                    set the light directly
  quit";

#[derive(Debug, PartialEq)]
enum Command {
    Status,
    Alarm {
        enabled: bool,
        wakeup: Option<String>,
        fade_minutes: Option<f64>,
    },
    Preset(Preset),
    Level(f64),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            bail!("empty command");
        };
        let command = match head.to_ascii_lowercase().as_str() {
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "alarm" => {
                let enabled = match words.next() {
                    Some("on") => true,
                    Some("off") => false,
                    _ => bail!("expected `alarm on` or `alarm off`"),
                };
                let wakeup = words.next().map(str::to_string);
                let fade_minutes = words
                    .next()
                    .map(|m| m.parse::<f64>().context("fade must be a number of minutes"))
                    .transpose()?;
                Command::Alarm {
                    enabled,
                    wakeup,
                    fade_minutes,
                }
            }
            "preset" => {
                let label = words.next().context("missing preset label")?;
                Command::Preset(label.parse()?)
            }
            "level" => {
                let value = words.next().context("missing level")?;
                Command::Level(value.parse().context("level must be a number")?)
            }
            other => Command::Preset(other.parse()?),
        };
        if words.next().is_some() {
            bail!("too many arguments");
        }
        Ok(command)
    }
}

/// Reads commands until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    controller: &AlarmController,
    input: R,
    mut output: W,
) -> anyhow::Result<()> {
    writeln!(output, "{HELP}")?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "error: {e:#}")?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(controller, command, &mut output) {
            writeln!(output, "error: {e:#}")?;
        }
    }
    Ok(())
}

fn execute<W: Write>(
    controller: &AlarmController,
    command: Command,
    output: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Status => {}
        Command::Help | Command::Quit => {
            writeln!(output, "{HELP}")?;
            return Ok(());
        }
        Command::Alarm {
            enabled,
            wakeup,
            fade_minutes,
        } => {
            let current = AlarmSettings::from_controller(controller);
            let form = AlarmSettings {
                enabled,
                wakeup: wakeup.unwrap_or(current.wakeup),
                fade_minutes: fade_minutes.unwrap_or(current.fade_minutes),
            };
            let applied = form.apply(controller)?;
            if applied.wakeup.fell_back() {
                writeln!(output, "wake-up time not understood, using current time")?;
            }
        }
        Command::Preset(preset) => controller.apply_preset(preset)?,
        Command::Level(level) => controller.set_intensity(level)?,
    }
    let window = controller.window();
    writeln!(
        output,
        "light {:.0}%, alarm {} at {} fading over {} min",
        100.0 * controller.intensity(),
        if controller.enabled() { "on" } else { "off" },
        settings::wakeup_label(&window),
        settings::fade_minutes(&window)
    )?;
    Ok(())
}

//! Mystic Light CLI tool
//!
//! Controls MSI Mystic Light devices through the vendor SDK. The SDK DLL must
//! be on the library search path or passed with `--sdk-path`.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mysticlight::{is_process_elevated, Color, Device, Error, Led, MysticLight, SdkConfig};

fn main() {
    let cli = cli();
    init_logging(cli.get_flag("verbose"));

    let result = match cli.subcommand() {
        Some(("elevated", _)) => {
            println!("{}", is_process_elevated());
            Ok(())
        },
        Some(("devices", _)) => with_sdk(&cli, list_devices),
        Some(("get", matches)) => with_sdk(&cli, |sdk| get_led(sdk, matches)),
        Some(("set", matches)) => with_sdk(&cli, |sdk| set_led(sdk, matches)),
        _ => unreachable!("subcommand required"),
    };

    if let Err(err) = result {
        eprintln!("\x1b[31mError:\x1b[0m {err}");
        process::exit(1);
    }
}

/// Install the log subscriber, `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

/// Initialize the SDK and run a command with it.
fn with_sdk<F>(matches: &ArgMatches, f: F) -> Result<(), Error>
where
    F: FnOnce(&MysticLight) -> Result<(), Error>,
{
    let config = SdkConfig {
        library_path: matches.get_one::<PathBuf>("sdk-path").cloned(),
        require_elevation: !matches.get_flag("no-elevation-check"),
    };
    debug!("SDK config: {:?}", config);

    let sdk = MysticLight::new(&config)?;
    f(&sdk)
}

/// Print all devices with their LEDs.
fn list_devices(sdk: &MysticLight) -> Result<(), Error> {
    for device in sdk.devices()? {
        println!("{} ({}):", device.identifier(), device.name()?);
        for led in device.leds() {
            println!("  [{}] {}", led.index(), led.name());
            println!("      styles: {}", led.styles().join(", "));
        }
    }

    Ok(())
}

/// Print the state of one LED.
fn get_led(sdk: &MysticLight, matches: &ArgMatches) -> Result<(), Error> {
    let devices = sdk.devices()?;
    let device = required_device(&devices, matches)?;
    let led = required_led(device, matches)?;

    println!("{} [{}] {}", device.identifier(), led.index(), led.name());
    println!("  color:      {}", led.color()?);
    println!("  style:      {}", led.style()?);
    println!("  brightness: {}/{}", led.brightness()?, led.max_brightness()?);
    println!("  speed:      {}/{}", led.speed()?, led.max_speed()?);

    Ok(())
}

/// Apply the requested changes to one LED.
fn set_led(sdk: &MysticLight, matches: &ArgMatches) -> Result<(), Error> {
    let devices = sdk.devices()?;
    let device = required_device(&devices, matches)?;
    let led = required_led(device, matches)?;

    if let Some(style) = matches.get_one::<String>("style") {
        led.set_style(style)?;
    }

    if let Some(color) = matches.get_one::<String>("color") {
        let color = Color::from_str(color).map_err(|_| {
            Error::InvalidArgument(format!("color '{color}' does not match format 0xRRGGBB"))
        })?;
        led.set_color(color)?;
    }

    if let Some(brightness) = matches.get_one::<u32>("brightness") {
        led.set_brightness(*brightness)?;
    }

    if let Some(speed) = matches.get_one::<u32>("speed") {
        led.set_speed(*speed)?;
    }

    println!("\x1b[32mSuccessfully applied changes.\x1b[0m");

    Ok(())
}

/// Get clap CLI parameters.
fn cli() -> ArgMatches {
    let device = Arg::new("device").help("Device identifier").long("device").short('d');
    let led = Arg::new("led")
        .help("LED index")
        .long("led")
        .short('l')
        .value_parser(clap::value_parser!(u32));

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .subcommand_required(true)
        .arg(
            Arg::new("sdk-path")
                .help("Mystic Light SDK DLL or directory containing it")
                .long("sdk-path")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-elevation-check")
                .help("Skip the administrator privilege check")
                .long("no-elevation-check")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .help("Enable debug logging")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("devices").about("List all devices and their LEDs"))
        .subcommand(Command::new("elevated").about("Check for administrator privileges"))
        .subcommand(
            Command::new("get").about("Show the state of an LED").arg(device.clone()).arg(led.clone()),
        )
        .subcommand(
            Command::new("set")
                .about("Change an LED")
                .arg(device)
                .arg(led)
                .arg(Arg::new("color").help("LED color in RGB [0xRRGGBB]").long("color").short('c'))
                .arg(Arg::new("style").help("LED style").long("style").short('s'))
                .arg(
                    Arg::new("brightness")
                        .help("Brightness level [possible values: 0..=max]")
                        .long("brightness")
                        .short('b')
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("speed")
                        .help("Animation speed level [possible values: 0..=max]")
                        .long("speed")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .get_matches()
}

/// Read the device option from CLI or prompt for STDIN if not present.
fn required_device<'a, 'b>(
    devices: &'a [Device<'b>],
    matches: &ArgMatches,
) -> Result<&'a Device<'b>, Error> {
    if devices.is_empty() {
        return Err(Error::InvalidArgument("no Mystic Light devices found".into()));
    }

    if let Some(identifier) = matches.get_one::<String>("device") {
        return devices
            .iter()
            .find(|device| device.identifier() == identifier)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown device '{identifier}'")));
    }

    let names: Vec<&str> = devices.iter().map(|device| device.identifier()).collect();
    let index = select("device", &names)?;
    Ok(&devices[index])
}

/// Read the LED option from CLI or prompt for STDIN if not present.
fn required_led<'a, 'b>(
    device: &'a Device<'b>,
    matches: &ArgMatches,
) -> Result<&'a Led<'b>, Error> {
    if device.leds().is_empty() {
        return Err(Error::InvalidArgument(format!("{} has no LEDs", device.identifier())));
    }

    if let Some(index) = matches.get_one::<u32>("led") {
        return device
            .led(*index)
            .ok_or_else(|| Error::InvalidArgument(format!("LED {index} does not exist")));
    }

    let names: Vec<&str> = device.leds().iter().map(|led| led.name()).collect();
    let index = select("led", &names)?;
    Ok(&device.leds()[index])
}

/// Offer all options and read the selection from STDIN.
fn select(name: &str, options: &[&str]) -> Result<usize, Error> {
    loop {
        println!("[{}] Please select a number:", name);
        for (i, option) in options.iter().enumerate() {
            println!("  [{}] {}", i, option);
        }
        print!(" > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline()
            .ok_or_else(|| Error::InvalidArgument(format!("no {name} selected")))?;

        match usize::from_str(&input) {
            Ok(index) if index < options.len() => {
                println!();
                return Ok(index);
            },
            // Query again if the selection is not valid.
            _ => println!("\x1b[31mOption '{}' does not exist, please try again.\x1b[0m\n", input),
        }
    }
}

/// Read next line from STDIN, `None` once STDIN is closed.
#[inline]
fn stdin_nextline() -> Option<String> {
    let mut input = String::new();

    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use c_linkage::{
    AbiConfig, CallDescriptor, HOST, Location, MachineSignature, Target, build_c_descriptor,
};

#[derive(Parser)]
#[command(name = "c-linkage")]
#[command(about = "Inspect native (C) call descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the call descriptor for a signature.
    Describe {
        #[arg(help = "Signature as '<params> -> <returns>', e.g. 'i32, ptr -> i64'")]
        signature: String,

        #[arg(
            short,
            long,
            help = "Target whose calling convention to use (defaults to the host)"
        )]
        target: Option<String>,

        #[arg(long, help = "Print the descriptor as JSON")]
        json: bool,

        #[arg(long, help = "Reject floating-point returns and parameters")]
        strict: bool,
    },
    /// List targets with a calling convention table.
    Targets,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Describe {
            signature,
            target,
            json,
            strict,
        } => {
            let sig: MachineSignature = signature
                .parse()
                .with_context(|| format!("Failed to parse signature '{signature}'"))?;
            if strict {
                sig.check_no_floats().context("Signature rejected")?;
            }

            let config = match target {
                Some(name) => name.parse::<Target>()?.config(),
                None => HOST,
            };
            if !config.is_supported() {
                anyhow::bail!("{}", c_linkage::UNSUPPORTED_ARCHITECTURE);
            }
            if sig.return_count() > config.return_registers().len() {
                anyhow::bail!(
                    "{} returns at most {} values, signature has {}",
                    config.name(),
                    config.return_registers().len(),
                    sig.return_count()
                );
            }
            tracing::debug!(abi = config.name(), %sig, "describing");

            let desc = build_c_descriptor(config, &sig);
            if json {
                let value = descriptor_json(config, &desc);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print_descriptor(config, &desc);
            }
        }
        Commands::Targets => {
            let host = Target::host();
            for target in Target::ALL {
                let marker = if host == Some(target) { " (host)" } else { "" };
                println!("{target}{marker}");
            }
            if host.is_none() {
                println!("host: unsupported");
            }
        }
    }

    Ok(())
}

fn location_name(config: &AbiConfig, loc: Location) -> String {
    match loc {
        Location::Register(reg) => config.display_register(reg),
        Location::Stack(offset) => format!("stack[{offset}]"),
        Location::AnyRegister => "any register".to_string(),
    }
}

fn print_descriptor(config: &AbiConfig, desc: &CallDescriptor<'_>) {
    let sig = desc.machine_signature();
    println!("{} ({})", desc.debug_name(), config.name());
    println!("  signature: {sig}");
    println!(
        "  target: {} in {}",
        desc.target_type(),
        location_name(config, desc.target_location())
    );
    for (i, loc) in desc.location_signature().returns().iter().enumerate() {
        println!(
            "  return {i}: {} in {}",
            sig.get_return(i),
            location_name(config, *loc)
        );
    }
    for (i, loc) in desc.location_signature().params().iter().enumerate() {
        println!(
            "  param {i}: {} in {}",
            sig.get_param(i),
            location_name(config, *loc)
        );
    }
    println!("  callee-saved: {}", config.callee_saved_names().join(", "));
    println!(
        "  callee-saved fp: {}",
        config.callee_saved_fp_names().join(", ")
    );
}

fn descriptor_json(config: &AbiConfig, desc: &CallDescriptor<'_>) -> serde_json::Value {
    let sig = desc.machine_signature();
    let slot = |ty: c_linkage::MachineType, loc: Location| {
        serde_json::json!({
            "type": ty.name(),
            "location": location_name(config, loc),
        })
    };
    let returns: Vec<_> = desc
        .location_signature()
        .returns()
        .iter()
        .enumerate()
        .map(|(i, loc)| slot(sig.get_return(i), *loc))
        .collect();
    let params: Vec<_> = desc
        .location_signature()
        .params()
        .iter()
        .enumerate()
        .map(|(i, loc)| slot(sig.get_param(i), *loc))
        .collect();

    serde_json::json!({
        "name": desc.debug_name(),
        "target": config.name(),
        "call_target": slot(desc.target_type(), desc.target_location()),
        "returns": returns,
        "params": params,
        "stack_params": desc.stack_parameter_count(),
        "callee_saved": config.callee_saved_names(),
        "callee_saved_fp": config.callee_saved_fp_names(),
        "callee_saved_mask": desc.callee_saved_registers(),
        "callee_saved_fp_mask": desc.callee_saved_fp_registers(),
    })
}

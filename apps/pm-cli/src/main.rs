use clap::{Parser, Subcommand, ValueEnum};
use pm_motor::{
    AnalysisConfig, AnalysisReport, ControlConfig, MotorError, MotorResult, PoleRecord,
    StepConfig, load_config, run_analysis, state_space, sweep_gain, sweep_values, validate_config,
};
use pm_core::to_rpm;
use pm_sim::StepInfo;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pm-cli")]
#[command(about = "PMSM loop analysis - poles, DC gain and step responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Close the configured loop and run the step response
    Analyze {
        /// Path to the analysis YAML file
        config_path: PathBuf,
        /// Write the step response to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Print open- and closed-loop poles with damping figures
    Poles {
        /// Path to the analysis YAML file
        config_path: PathBuf,
    },
    /// Print a starter analysis file
    Template {
        #[arg(long, value_enum, default_value_t = TemplateKind::StateFeedback)]
        control: TemplateKind,
    },
    /// Closed-loop poles while one state-feedback gain entry varies
    Sweep {
        /// Path to the analysis YAML file
        config_path: PathBuf,
        /// State index of the swept gain (0 position, 1 speed, 2 current)
        #[arg(long)]
        index: usize,
        #[arg(long)]
        from: f64,
        #[arg(long)]
        to: f64,
        #[arg(long, default_value_t = 11)]
        steps: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateKind {
    OpenLoop,
    StateFeedback,
    Pi,
    Pid,
}

fn main() -> MotorResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config_path,
            csv,
            json,
        } => cmd_analyze(&config_path, csv.as_deref(), json),
        Commands::Poles { config_path } => cmd_poles(&config_path),
        Commands::Template { control } => cmd_template(control),
        Commands::Sweep {
            config_path,
            index,
            from,
            to,
            steps,
        } => cmd_sweep(&config_path, index, from, to, steps),
    }
}

fn cmd_analyze(config_path: &Path, csv: Option<&Path>, json: bool) -> MotorResult<()> {
    let config = load_config(config_path)?;
    let report = run_analysis(&config)?;

    if let Some(path) = csv {
        let names: Vec<&str> = report.outputs.iter().map(String::as_str).collect();
        report
            .step
            .write_csv(BufWriter::new(File::create(path)?), &names)?;
        info!(path = %path.display(), samples = report.step.len(), "step response written");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    println!("Analysis: {}", report.name);
    if let Some(kr) = report.reference_gain {
        println!("  Reference gain: {kr:.4}");
    }
    println!("\nClosed-loop transfer function:");
    for (name, tf) in report.outputs.iter().zip(&report.transfer_function) {
        println!("  {name}: {tf}");
    }
    print_poles("Closed-loop poles", &report.closed_loop_poles);
    println!(
        "  {}",
        if report.stable { "✓ Stable" } else { "✗ Not asymptotically stable" }
    );
    if let Some(p) = &report.dominant_pole {
        println!(
            "  Dominant pole: {:.4} {:+.4}j (zeta = {:.4})",
            p.re, p.im, p.damping_ratio
        );
    }

    println!("\nDC gain:");
    for (name, dc) in report.outputs.iter().zip(&report.dc_gain) {
        match dc {
            Some(g) => println!("  {name}: {g:.6}"),
            None => println!("  {name}: undefined (pole at the origin)"),
        }
    }

    println!("\nStep response ({} samples):", report.step.len());
    for (name, info) in report.outputs.iter().zip(&report.step_info) {
        print_step_info(name, info);
        if name == "speed" {
            println!("    ({:.1} rpm)", to_rpm(info.steady_state));
        }
    }
    if let Some(effort) = &report.control_effort {
        if let Some(u) = effort.final_value(0) {
            println!("  control effort settles at {u:.4}");
        }
    }
}

fn print_step_info(name: &str, info: &StepInfo) {
    let fmt_time = |t: Option<f64>| match t {
        Some(t) => format!("{t:.4} s"),
        None => "-".to_string(),
    };
    println!(
        "  {name}: final {:.4}  peak {:.4} at {:.4} s  overshoot {:.2}%  rise {}  settle {}",
        info.steady_state,
        info.peak,
        info.peak_time,
        info.overshoot,
        fmt_time(info.rise_time),
        fmt_time(info.settling_time)
    );
}

fn print_poles(title: &str, poles: &[PoleRecord]) {
    println!("\n{title}:");
    if poles.is_empty() {
        println!("  (none)");
    }
    for p in poles {
        println!(
            "  {:>12.4} {:+12.4}j   wn = {:<10.4} zeta = {:.4}",
            p.re, p.im, p.natural_frequency, p.damping_ratio
        );
    }
}

fn cmd_poles(config_path: &Path) -> MotorResult<()> {
    let config = load_config(config_path)?;
    let plant = state_space(&config.motor, config.output)?;
    println!(
        "Motor: Kt = {:.6} N·m/A, Ke = {:.6} V·s/rad",
        config.motor.torque_constant(),
        config.motor.back_emf_constant()
    );
    println!("Plant: {} states, {} outputs", plant.states(), plant.outputs());

    let report = run_analysis(&AnalysisConfig {
        step: StepConfig {
            samples: 2,
            ..config.step.clone()
        },
        ..config
    })?;
    print_poles("Open-loop poles", &report.open_loop_poles);
    print_poles("Closed-loop poles", &report.closed_loop_poles);
    Ok(())
}

fn cmd_template(kind: TemplateKind) -> MotorResult<()> {
    let (name, control) = match kind {
        TemplateKind::OpenLoop => ("open_loop", ControlConfig::OpenLoop),
        TemplateKind::StateFeedback => (
            "speed_state_feedback",
            ControlConfig::StateFeedback {
                gain: vec![0.0, 0.001, 0.0],
                reference_gain: Some(424.0),
                unity_dc_gain: false,
            },
        ),
        TemplateKind::Pi => ("speed_pi", ControlConfig::Pi { kp: 0.001, ki: 0.01 }),
        TemplateKind::Pid => (
            "speed_pid",
            ControlConfig::Pid {
                kp: 0.001,
                ti: 0.1,
                td: 1e-5,
                td_filter: 1e-4,
            },
        ),
    };
    let config = AnalysisConfig {
        name: name.to_string(),
        control,
        ..AnalysisConfig::default()
    };
    validate_config(&config)?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn cmd_sweep(
    config_path: &Path,
    index: usize,
    from: f64,
    to: f64,
    steps: usize,
) -> MotorResult<()> {
    if steps == 0 {
        return Err(MotorError::InvalidConfig {
            what: "sweep needs at least one step".to_string(),
        });
    }
    let config = load_config(config_path)?;
    let records = sweep_gain(&config, index, &sweep_values(from, to, steps))?;

    println!("Sweeping K[{index}] from {from} to {to}:");
    for record in records {
        let stable = record.poles.iter().all(|p| p.re < 0.0);
        let poles: Vec<String> = record
            .poles
            .iter()
            .map(|p| format!("{:.3}{:+.3}j", p.re, p.im))
            .collect();
        println!(
            "  K = {:<12.6} {} [{}]",
            record.gain,
            if stable { "✓" } else { "✗" },
            poles.join(", ")
        );
    }
    Ok(())
}

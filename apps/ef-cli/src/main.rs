use clap::{Parser, ValueEnum};
use ef_results::{PlotLabels, ResultSeries, ResultsError, fingerprint, plot_json, write_csv};
use ef_sim::{IntegratorType, ModelSpec, SimError, SimOptions, SimProgress, run_with_progress};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ef-cli")]
#[command(about = "EpiFlow CLI - SIR epidemic simulation", long_about = None)]
struct Cli {
    /// YAML model spec; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Initial susceptible count
    #[arg(long)]
    s0: Option<f64>,
    /// Initial infected count
    #[arg(long)]
    i0: Option<f64>,
    /// Initial recovered count
    #[arg(long)]
    r0: Option<f64>,
    /// Transmission rate
    #[arg(long)]
    beta: Option<f64>,
    /// Recovery rate
    #[arg(long)]
    gamma: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    t_start: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    t_end: Option<f64>,
    /// Budget of attempted internal steps
    #[arg(long)]
    max_steps: Option<usize>,
    #[arg(long)]
    abs_tol: Option<f64>,
    #[arg(long)]
    rel_tol: Option<f64>,
    /// Output sample spacing
    #[arg(long)]
    dt_out: Option<f64>,
    /// Embedded Runge-Kutta pair
    #[arg(long, value_enum, default_value_t = Method::Dopri54)]
    method: Method,
    /// Upper bound on the internal step size
    #[arg(long)]
    max_step: Option<f64>,
    /// First trial step (estimated when omitted)
    #[arg(long)]
    initial_step: Option<f64>,
    /// Write the sampled series as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write a Vega-Lite plot document (JSON)
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Print the effective model spec as YAML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    /// Dormand-Prince 5(4)
    Dopri54,
    /// Bogacki-Shampine 3(2)
    Bs32,
}

impl From<Method> for IntegratorType {
    fn from(m: Method) -> Self {
        match m {
            Method::Dopri54 => IntegratorType::DormandPrince54,
            Method::Bs32 => IntegratorType::BogackiShampine32,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error("Failed to write {path}: {source}", path = .path.display())]
    Write { path: PathBuf, source: io::Error },
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let spec = effective_spec(&cli)?;

    if cli.print_config {
        print!("{}", spec.to_yaml_string()?);
        return Ok(());
    }

    let opts = SimOptions {
        integrator: cli.method.into(),
        initial_step: cli.initial_step,
        max_step: cli.max_step,
        ..SimOptions::default()
    };

    println!(
        "Running SIR simulation ({}): beta = {:e}, gamma = {}, R0 = {:.3}",
        opts.integrator.name(),
        spec.beta,
        spec.gamma,
        spec.basic_reproduction_number()
    );

    let started = Instant::now();
    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let series = run_with_progress(
        &spec,
        &opts,
        Some(&mut |p: &SimProgress| {
            let emit_now = (p.fraction_complete - last_fraction).abs() >= 0.005
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(p, started.elapsed().as_secs_f64());
                last_fraction = p.fraction_complete;
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();
    let series = series?;
    let solve_time_s = started.elapsed().as_secs_f64();

    println!("✓ Simulation completed");
    print_summary(&series, solve_time_s);

    if let Some(path) = &cli.csv {
        let file = File::create(path).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        write_csv(&series, BufWriter::new(file))?;
        println!("✓ Exported {} samples to {}", series.len(), path.display());
    }

    if let Some(path) = &cli.plot {
        write_file(path, &plot_json(&series, &PlotLabels::default())?)?;
        println!("✓ Wrote plot document to {}", path.display());
    }

    Ok(())
}

/// Defaults, then the config file, then individual flags.
fn effective_spec(cli: &Cli) -> CliResult<ModelSpec> {
    let mut spec = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading model spec");
            ModelSpec::load_yaml(path)?
        }
        None => ModelSpec::default(),
    };

    let overrides: [(&mut f64, Option<f64>); 10] = [
        (&mut spec.s0, cli.s0),
        (&mut spec.i0, cli.i0),
        (&mut spec.r0, cli.r0),
        (&mut spec.beta, cli.beta),
        (&mut spec.gamma, cli.gamma),
        (&mut spec.t_start, cli.t_start),
        (&mut spec.t_end, cli.t_end),
        (&mut spec.abs_tol, cli.abs_tol),
        (&mut spec.rel_tol, cli.rel_tol),
        (&mut spec.dt_out, cli.dt_out),
    ];
    for (field, value) in overrides {
        if let Some(v) = value {
            *field = v;
        }
    }
    if let Some(n) = cli.max_steps {
        spec.max_steps = n;
    }

    spec.validate()?;
    Ok(spec)
}

fn write_file(path: &Path, content: &str) -> CliResult<()> {
    std::fs::write(path, content).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(p: &SimProgress, elapsed_s: f64) {
    let width = 28usize;
    let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    print!(
        "\r[{}] {:>6.2}%  t={:.3}/{:.3}  step={}  rejected={}  elapsed={:.1}s",
        bar,
        p.fraction_complete * 100.0,
        p.t,
        p.t_end,
        p.step,
        p.rejected,
        elapsed_s
    );
    let _ = io::stdout().flush();
}

fn print_summary(series: &ResultSeries, solve_time_s: f64) {
    let first = series.first();
    let last = series.last();
    let peak = series.peak_infected();
    let d = series.diagnostics();

    println!(
        "  Samples: {} (t = {:.3} .. {:.3})",
        series.len(),
        first.t,
        last.t
    );
    println!("  Peak infected: {:.1} at t = {:.3}", peak.infected, peak.t);
    println!(
        "  Final state: S = {:.2}, I = {:.2}, R = {:.2}",
        last.susceptible, last.infected, last.recovered
    );

    println!("\nSolver summary:");
    println!(
        "  Steps: {} (accepted {}, rejected {})",
        d.steps, d.accepted_steps, d.rejected_steps
    );
    println!("  RHS evaluations: {}", d.rhs_evaluations);
    println!(
        "  Population drift: {:.3e} ({})",
        d.max_population_drift,
        if d.conservation_ok { "ok" } else { "exceeds rel_tol" }
    );
    println!("  Min component: {:.3e}", d.min_component);
    println!("  Fingerprint: {}", fingerprint(series));
    println!("  Solve: {:.3}s", solve_time_s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::try_parse_from(["ef-cli"]).unwrap();
        assert_eq!(effective_spec(&cli).unwrap(), ModelSpec::default());
        assert!(matches!(cli.method, Method::Dopri54));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ef-cli", "--beta", "2e-6", "--t-end", "50", "--max-steps", "10", "--method", "bs32",
        ])
        .unwrap();
        let spec = effective_spec(&cli).unwrap();
        assert_eq!(spec.beta, 2e-6);
        assert_eq!(spec.t_end, 50.0);
        assert_eq!(spec.max_steps, 10);
        assert_eq!(spec.gamma, ModelSpec::default().gamma);
        assert_eq!(
            IntegratorType::from(cli.method),
            IntegratorType::BogackiShampine32
        );
    }

    #[test]
    fn invalid_override_rejected() {
        let cli = Cli::try_parse_from(["ef-cli", "--t-start", "200"]).unwrap();
        assert!(matches!(
            effective_spec(&cli),
            Err(CliError::Sim(SimError::InvalidSpec { field: "t_end", .. }))
        ));
    }

    #[test]
    fn unknown_method_rejected() {
        assert!(Cli::try_parse_from(["ef-cli", "--method", "rk4"]).is_err());
    }
}

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use stoppalot::serve::ChartQuery;
use stoppalot::{loader, Category, ChartBundle};

#[derive(Parser, Debug)]
#[command(name = "stoppalot")]
#[command(author, version, about = "Downtime reporting dashboards from equipment event spreadsheets")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Downtime spreadsheet (CSV) to report on
    path: Option<PathBuf>,

    /// Which label set drives the category filter and Pareto ordering
    #[arg(long, value_enum, default_value_t = Pivot::Original)]
    pivot: Pivot,

    /// Include only these categories (repeatable; default: all)
    #[arg(short, long = "category")]
    categories: Vec<String>,

    /// Include only these equipment names (repeatable; default: all)
    #[arg(short, long = "equipment")]
    equipment: Vec<String>,

    /// Window start, e.g. 2024-01-01T06:00 (requires --to)
    #[arg(long)]
    from: Option<String>,

    /// Window end
    #[arg(long)]
    to: Option<String>,

    /// Daily time-of-day band start, e.g. 06:00 (with --day-end, switches
    /// the window to a recurring band across the --from/--to dates)
    #[arg(long)]
    day_start: Option<String>,

    /// Daily time-of-day band end
    #[arg(long)]
    day_end: Option<String>,

    /// Duration display unit
    #[arg(short, long, value_enum, default_value_t = Unit::Hours)]
    unit: Unit,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "stoppalot-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate a CSV report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open the report
    #[arg(long)]
    no_open: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Also print the filtered event table
    #[arg(short, long)]
    verbose: bool,

    /// Only show the summary line
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive dashboard in a browser
    Serve {
        /// Downtime spreadsheet (CSV) to report on
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pivot {
    Original,
    Reclassified,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Unit {
    Seconds,
    Hours,
    Days,
}

fn main() {
    let args = Args::parse();

    if let Some(Command::Serve { path, port }) = args.command {
        if let Err(e) = stoppalot::serve::start(port, path) {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let Some(path) = args.path.clone() else {
        eprintln!("Usage: stoppalot <FILE.csv>");
        eprintln!("Run 'stoppalot --help' for filters, or 'stoppalot serve <FILE.csv>' for the dashboard.");
        std::process::exit(1);
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    // One ChartQuery drives both the CLI and the dashboard API, so the two
    // surfaces can never drift apart.
    let query = ChartQuery {
        pivot: Some(
            match args.pivot {
                Pivot::Original => "original",
                Pivot::Reclassified => "reclassified",
            }
            .to_string(),
        ),
        categories: join_multi(&args.categories),
        equipment: join_multi(&args.equipment),
        from: args.from.clone(),
        to: args.to.clone(),
        day_start: args.day_start.clone(),
        day_end: args.day_end.clone(),
        unit: Some(
            match args.unit {
                Unit::Seconds => "seconds",
                Unit::Hours => "hours",
                Unit::Days => "days",
            }
            .to_string(),
        ),
    };

    let pipeline = match query.to_pipeline() {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Invalid filter: {}", msg);
            std::process::exit(2);
        }
    };

    let table = match loader::load(&path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    if !args.quiet {
        eprintln!("\x1b[1mStoppalot - Downtime Reporter\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!(
            "Loaded {} event(s) from {}",
            table.events.len(),
            path.display()
        );
        if table.dropped_rows > 0 {
            eprintln!(
                "\x1b[33mDropped {} row(s) with end before start\x1b[0m",
                table.dropped_rows
            );
        }
        eprintln!();
    }

    let bundle = pipeline.run(&table.events);

    print_summary(&bundle, &args);

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        // Auto-generate report
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("stoppalot_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        if let Err(e) = stoppalot::report::generate(output_path, &bundle) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        // Open report
        if !args.no_open && !args.quiet {
            eprint!("\nOpen report? [y/N] ");
            io::stderr().flush().ok();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_ok() {
                let input = input.trim().to_lowercase();
                if input == "y" || input == "yes" {
                    if let Err(e) = open::that(output_path) {
                        eprintln!("Failed to open report: {}", e);
                    }
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mDone.\x1b[0m");
    }
}

fn join_multi(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

fn category_color(name: &str) -> &'static str {
    match Category::parse(name) {
        Category::ProductionTime => "\x1b[32m",     // Green
        Category::UnplannedStoppages => "\x1b[31m", // Red
        Category::NotOccupied => "\x1b[90m",        // Gray
        Category::PlannedStoppages => "\x1b[33m",   // Yellow
        Category::Other(_) => "\x1b[34m",           // Blue
    }
}

fn print_summary(bundle: &ChartBundle, args: &Args) {
    let unit = bundle.unit.label();
    let reset = "\x1b[0m";

    println!("{} event(s) after filtering", bundle.event_count);

    for pareto in &bundle.paretos {
        println!("\n\x1b[1m{} - duration in {}\x1b[0m", pareto.title, unit);
        if pareto.categories.is_empty() {
            println!("  (no events)");
            continue;
        }
        for i in 0..pareto.categories.len() {
            println!(
                "  {}{:<24}{} {:>12.4}  {:>6.2}%",
                category_color(&pareto.categories[i]),
                pareto.categories[i],
                reset,
                pareto.totals[i],
                pareto.cumulative_pct[i]
            );
        }
    }

    println!("\n\x1b[1mReclassification gap - {}\x1b[0m", unit);
    println!(
        "  {:<24} {:>12} {:>12} {:>12}",
        "Category", "Original", "Reclassified", "Gap"
    );
    for row in &bundle.waterfall.table {
        let name = row.category.to_string();
        let color = if row.is_total {
            "\x1b[1m"
        } else {
            category_color(&name)
        };
        println!(
            "  {}{:<24}{} {:>12.4} {:>12.4} {:>12.4}",
            color, name, reset, row.original, row.reclassified, row.gap
        );
    }

    if args.verbose && !bundle.events.is_empty() {
        println!("\n\x1b[1mFiltered events\x1b[0m");
        for e in &bundle.events {
            println!(
                "  {}  {} → {}  {}{:<20}{} {:>10.4} {}  {}",
                e.start,
                e.equipment_original,
                e.equipment_reclassified,
                category_color(&e.category_reclassified),
                e.category_reclassified,
                reset,
                e.duration,
                unit,
                e.plc_code
            );
        }
    }
}

/*
Copyright 2022 Volker Schwaberow <volker@schwaberow.de>
Permission is hereby granted, free of charge, to any person obtaining a
copy of this software and associated documentation files (the
"Software"), to deal in the Software without restriction, including without
limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the
Software is furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be
included in all copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR
OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
DEALINGS IN THE SOFTWARE.
Author(s): Volker Schwaberow
*/

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::warn;
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use rblind::cli::{Cli, Commands, ScanArgs};
use rblind::reports::{ReportConfig, ReportEngine};
use rblind::rules::RuleHandler;
use rblind::scanner::{ScanOutput, ScanTarget, Scanner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    if let Err(e) = SimpleLogger::new().with_level(cli.log_level()).init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let result = match &cli.command {
        Commands::Scan(args) => run_scan(args, cli.quiet).await,
        Commands::Rules => {
            print_rules();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn print_rules() {
    let handler = RuleHandler::new();
    for rule in handler.rules() {
        println!(
            "{} {} (CWE-{})",
            format!("{:<8}", rule.id()).cyan().bold(),
            rule.name().bold(),
            rule.cwe()
        );
        for family in rule.families() {
            println!(
                "         {:<12} {} payloads, tech: {}",
                family.name,
                family.templates.len(),
                family.tech.join(", ")
            );
        }
    }
}

async fn run_scan(args: &ScanArgs, quiet: bool) -> Result<()> {
    let from_stdin = args.urls.is_empty() && args.input_file.is_none();
    if from_stdin && !args.i_have_authorization {
        anyhow::bail!(
            "Reading targets from stdin requires --i-have-authorization, \
             the prompt needs stdin too"
        );
    }

    if !args.i_have_authorization && !confirm_authorization()? {
        println!("{}", "Authorization not confirmed. Exiting for safety.".red());
        println!("   Use --i-have-authorization flag only if you have proper authorization.");
        return Ok(());
    }

    let targets = load_targets(args)?;
    if targets.is_empty() {
        anyhow::bail!("No targets specified. Use -u, -i or pipe targets on stdin");
    }

    let config = args.to_config();
    let rules = RuleHandler::new().select(config.rules())?;
    let scanner = Scanner::new(config, rules)?.with_progress(!quiet && !args.no_progress);

    let stop = scanner.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for running probes to finish");
            stop.stop();
        }
    });

    if !quiet {
        println!("Loaded {} target(s)", targets.len());
    }
    let output = scanner.run(targets).await;

    if !quiet {
        print_summary(&output);
    }

    let engine = ReportEngine::new();
    let report_config = ReportConfig {
        include_samples: !args.no_samples,
        sort_by: args.sort,
    };
    let data = engine.create_report_data(output.totals, output.findings, &report_config);
    let content = engine.generate_report(
        &args.format,
        &data,
        &report_config,
        args.output.as_ref(),
    )?;

    match &args.output {
        Some(path) => {
            if !quiet {
                println!("Report written to {}", path.display().to_string().bold());
            }
        }
        None => println!("{}", content),
    }

    Ok(())
}

fn confirm_authorization() -> Result<bool> {
    println!("{}", "LEGAL REQUIREMENT:".bright_red().bold());
    println!("   Timing probes inject payloads into live parameters of the targets.");
    println!("   You MUST have explicit written authorization to test these targets.");
    println!();
    println!(
        "{}",
        "Do you have explicit written authorization to test all target systems? (yes/NO):"
            .bright_yellow()
    );
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("yes"))
}

fn load_targets(args: &ScanArgs) -> Result<Vec<ScanTarget>> {
    let mut lines: Vec<String> = args.urls.clone();

    if let Some(path) = &args.input_file {
        let file = File::open(path)
            .with_context(|| format!("Cannot open input file {}", path.display()))?;
        for line in BufReader::new(file).lines() {
            lines.push(line?);
        }
    } else if args.urls.is_empty() {
        for line in io::stdin().lock().lines() {
            lines.push(line?);
        }
    }

    let mut targets = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match ScanTarget::parse(trimmed, args.data.as_deref()) {
            Ok(target) => targets.push(target),
            Err(e) => warn!("Skipping target: {}", e),
        }
    }
    Ok(targets)
}

fn print_summary(output: &ScanOutput) {
    let totals = &output.totals;
    println!();
    println!(
        "{} injection points, {} requests ({} failed) in {:.1}s",
        totals.injection_points,
        totals.state.total_requests,
        totals.state.failed_requests,
        totals.state.duration_ms() as f64 / 1000.0
    );
    if totals.stopped {
        println!("{}", "Scan interrupted".yellow());
    }
    if output.findings.is_empty() {
        println!("{}", "No timing dependent parameters found".green());
        return;
    }
    for finding in &output.findings {
        println!(
            "{} {} {} '{}' {}",
            format!("[{}]", finding.rule).red().bold(),
            finding.url,
            finding.location,
            finding.parameter.bold(),
            finding.evidence.summary().dimmed()
        );
    }
}

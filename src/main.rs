use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use cachesim::{
    cache::IsCache,
    config::{Config, Instance},
    generator::Generator,
    report::{CacheStats, Reporter},
    trace::Trace,
};

const HELP: &str = "\
cachesim - simulate a direct-mapped or set-associative cache over an address stream

Usage:
  cachesim [run] -c <config> -d <data> [options]
  cachesim generate -c <config> -d <data> [--seed <n>]

Options:
  -c, --config <path>     cache config (JSON, or the 4-line text record)
  -d, --data <path>       address stream, one address per line (.xz accepted)
  -o, --out <path>        write the access table here instead of stdout
  --json <path>           write per-cache statistics as JSON
  --hex                   print addresses in hexadecimal
  --quiet                 only print the banner and summary of each cache
  --heartbeat <n>         log progress every <n> addresses
  --buffer-size <n>       addresses per block handed over by the reader
  --queue-size <n>        blocks buffered between reader and simulator
  --seed <n>              seed for `generate`
  --verbose               log at info level (RUST_LOG is honoured otherwise)
  -h, --help              print this help
  -v, --version           print the version
";

struct RunArgs {
    config: PathBuf,
    data: PathBuf,
    out: Option<PathBuf>,
    json: Option<PathBuf>,
    hex: bool,
    quiet: bool,
    heartbeat: u64,
    addrs_per_block: usize,
    blocks_per_queue: usize,
}

fn main() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    if args.contains(["-v", "--version"]) {
        println!("cachesim {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if args.contains("--verbose") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();
    } else {
        env_logger::init();
    }

    match args.subcommand()?.as_deref() {
        Some("generate") => generate(args),
        Some("run") | None => run(parse_run_args(args)?),
        Some(other) => bail!("unknown subcommand `{other}`, try --help"),
    }
}

fn finish(args: pico_args::Arguments) -> Result<()> {
    let rest = args.finish();
    if !rest.is_empty() {
        bail!("unexpected arguments: {rest:?}");
    }
    Ok(())
}

fn create(path: &Path) -> Result<fs::File> {
    fs::File::create(path)
        .with_context(|| format!("cannot open {}", path.display()))
}

fn parse_run_args(mut args: pico_args::Arguments) -> Result<RunArgs> {
    let run_args = RunArgs {
        config: args
            .value_from_str(["-c", "--config"])
            .context("a config is required, pass -c <path>")?,
        data: args
            .value_from_str(["-d", "--data"])
            .context("an address stream is required, pass -d <path>")?,
        out: args.opt_value_from_str(["-o", "--out"])?,
        json: args.opt_value_from_str("--json")?,
        hex: args.contains("--hex"),
        quiet: args.contains("--quiet"),
        heartbeat: args
            .opt_value_from_str("--heartbeat")
            .context("--heartbeat should be an integer")?
            .unwrap_or(0),
        addrs_per_block: args
            .opt_value_from_str("--buffer-size")
            .context("--buffer-size should be an integer")?
            .unwrap_or(1024 * 16),
        blocks_per_queue: args
            .opt_value_from_str("--queue-size")
            .context("--queue-size should be an integer")?
            .unwrap_or(32),
    };
    finish(args)?;
    Ok(run_args)
}

fn run(args: RunArgs) -> Result<()> {
    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    log::info!(
        "loaded {} cache config(s) from {}",
        config.caches.len(),
        args.config.display()
    );
    let mut caches = config.to_caches()?;

    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut reporter = Reporter::new(BufWriter::new(out))
        .hex(args.hex)
        .quiet(args.quiet);

    for instance in caches.iter_mut() {
        simulate(instance, &args, &mut reporter)?;
    }
    reporter.flush()?;

    if let Some(path) = &args.json {
        let stats = caches
            .iter()
            .map(|i| CacheStats::collect(&i.name, i.cache.as_ref()))
            .collect::<Vec<_>>();
        let mut stats_out = BufWriter::new(create(path)?);
        serde_json::to_writer_pretty(&mut stats_out, &stats)?;
        stats_out.flush()?;
        log::info!("wrote statistics to {}", path.display());
    }
    Ok(())
}

fn simulate<W: Write>(
    instance: &mut Instance,
    args: &RunArgs,
    reporter: &mut Reporter<W>,
) -> Result<()> {
    let trace = Trace::read(&args.data, args.addrs_per_block, args.blocks_per_queue)
        .with_context(|| format!("cannot open {}", args.data.display()))?;
    reporter.header(&instance.name, instance.cache.as_ref())?;

    let data = args.data.display();
    let mut seen = 0u64;
    let mut next_heartbeat = args.heartbeat;
    for block in trace.rec.iter() {
        let block = block.with_context(|| format!("failed to read {data}"))?;
        operate(instance.cache.as_mut(), &block, reporter)?;
        seen += block.len() as u64;
        if args.heartbeat != 0 && seen >= next_heartbeat {
            log::info!("{}: {seen} addresses", instance.name);
            while next_heartbeat <= seen {
                next_heartbeat += args.heartbeat;
            }
        }
    }

    reporter.footer(instance.cache.as_ref())?;
    log::info!(
        "{}: finished after {seen} addresses, {} hits / {} misses",
        instance.name,
        instance.cache.hit_count(),
        instance.cache.miss_count()
    );
    Ok(())
}

fn operate<W: Write>(
    cache: &mut dyn IsCache,
    addrs: &[u64],
    reporter: &mut Reporter<W>,
) -> io::Result<()> {
    for &addr in addrs {
        let access = cache.access(addr);
        reporter.access(&access)?;
    }
    Ok(())
}

fn generate(mut args: pico_args::Arguments) -> Result<()> {
    let config_path: PathBuf = args
        .value_from_str(["-c", "--config"])
        .context("an output config path is required, pass -c <path>")?;
    let data_path: PathBuf = args
        .value_from_str(["-d", "--data"])
        .context("an output data path is required, pass -d <path>")?;
    let seed: Option<u64> = args
        .opt_value_from_str("--seed")
        .context("--seed should be an integer")?;
    finish(args)?;

    let mut generator = seed.map_or_else(Generator::new, Generator::with_seed);

    let config = generator.config();
    let mut out = BufWriter::new(create(&config_path)?);
    Generator::write_config(&config, &mut out)?;
    out.flush()?;
    log::info!(
        "wrote {} cache config to {}",
        config.kind,
        config_path.display()
    );

    let addrs = generator.addresses();
    let mut out = BufWriter::new(create(&data_path)?);
    Generator::write_addresses(&addrs, &mut out)?;
    out.flush()?;
    log::info!(
        "wrote {} addresses to {}",
        addrs.len(),
        data_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn args(argv: &[&str]) -> pico_args::Arguments {
        pico_args::Arguments::from_vec(argv.iter().copied().map(OsString::from).collect())
    }

    #[test]
    fn test_run_args_eq_separator() {
        let argv = args(&["-c=cfg.txt", "-d=data.txt", "--hex"]);
        let run = parse_run_args(argv).unwrap();
        assert_eq!(run.config, PathBuf::from("cfg.txt"));
        assert_eq!(run.data, PathBuf::from("data.txt"));
        assert!(run.hex && !run.quiet);
        assert_eq!(run.out, None);
        assert_eq!(run.json, None);
        assert_eq!(run.heartbeat, 0);
        assert_eq!((run.addrs_per_block, run.blocks_per_queue), (1024 * 16, 32));
    }

    #[test]
    fn test_run_args_space_separated() {
        let argv = args(&["-c", "c.txt", "--data", "d.txt", "--queue-size", "4"]);
        let run = parse_run_args(argv).unwrap();
        assert_eq!(run.config, PathBuf::from("c.txt"));
        assert_eq!(run.data, PathBuf::from("d.txt"));
        assert_eq!(run.blocks_per_queue, 4);
        assert!(!run.hex);
    }

    #[test]
    fn test_run_args_outputs() {
        let argv = args(&["-c=a", "-d=b", "-o=t", "--json", "s.json", "--quiet"]);
        let run = parse_run_args(argv).unwrap();
        assert_eq!(run.out, Some(PathBuf::from("t")));
        assert_eq!(run.json, Some(PathBuf::from("s.json")));
        assert!(run.quiet);
    }

    fn rejects(argv: &[&str]) -> bool {
        parse_run_args(args(argv)).is_err()
    }

    #[test]
    fn test_run_args_rejects() {
        assert!(rejects(&["-d=data.txt"]));
        assert!(rejects(&["-c=a", "-d=b", "--bogus"]));
        assert!(rejects(&["-c=a", "-d=b", "--heartbeat=x"]));
    }
}

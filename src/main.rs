use anyhow::{bail, Result};
use clap::Parser;
use dnschan::args::Args;
use dnschan::config::load_config;
use dnschan::{Channel, QueryResult, RecordType};
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?.apply_args(&args);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level(args.verbose)?)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let types = args.record_types()?;

    let (destroyed_tx, destroyed_rx) = oneshot::channel();
    let options = config.channel_options()?
        .on_initial_connection(|res| match res {
            Ok(()) => info!("channel connected"),
            Err(e) => error!("channel failed to connect: {}", e),
        })
        .on_destroyed(move || {
            let _ = destroyed_tx.send(());
        });

    let channel = Channel::new(options)?;

    let lookups: Vec<_> = types.into_iter().map(|rtype| {
        let channel = channel.clone();
        let name = args.name.clone();

        tokio::spawn(async move {
            let res = channel.lookup(&name, rtype).await;

            (rtype, res)
        })
    }).collect();

    let mut failed = 0;
    for lookup in lookups {
        let (rtype, res) = lookup.await?;

        match res {
            Ok(result) => print_result(&args.name, rtype, &result),
            Err(e) => {
                eprintln!("{} {}: {}", args.name, rtype, e);
                failed += 1;
            }
        }
    }

    channel.destroy();
    let _ = destroyed_rx.await;

    if failed > 0 {
        bail!("{} of {} queries failed", failed, args.types.len());
    }

    Ok(())
}

fn print_result(name: &str, rtype: RecordType, result: &QueryResult) {
    println!(
        ";; {} {} id={} status={} answers={} time={}ms{}",
        name,
        rtype,
        result.id,
        result.rcode,
        result.answers.len(),
        result.elapsed.as_millis(),
        if result.truncated { " (truncated)" } else { "" }
    );

    for record in &result.answers {
        println!("{}", record);
    }

    if !result.authorities.is_empty() {
        println!(";; authority");
        for record in &result.authorities {
            println!("{}", record);
        }
    }

    println!();
}

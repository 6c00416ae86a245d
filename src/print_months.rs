use std::env;

use anyhow::Context;
use chrono::NaiveDate;
use ga_export::months::iterate_months;

const DEFAULT_START: &str = "2017-06-17";
const DEFAULT_END: &str = "2022-11-17";
const USAGE: &str = "usage: print_months [START [END]]";

fn parse_arg(arg: Option<String>, default: &str) -> anyhow::Result<NaiveDate> {
    let raw = arg.unwrap_or_else(|| default.to_string());
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").with_context(|| format!("bad date {raw:?}"))
}

/// START and END, each falling back to its default. Anything past END is an error.
fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let start = parse_arg(args.next(), DEFAULT_START)?;
    let end = parse_arg(args.next(), DEFAULT_END)?;
    if let Some(extra) = args.next() {
        anyhow::bail!("unexpected argument {extra:?}, {USAGE}");
    }
    Ok((start, end))
}

/// Prints the month ranges between two dates: `print_months [START [END]]`,
/// dates as `YYYY-MM-DD`.
fn main() -> anyhow::Result<()> {
    let (start, end) = parse_args(env::args().skip(1))?;
    for month in iterate_months(start, end)? {
        println!("{} {}", month.month_start, month.month_end);
    }
    Ok(())
}

use careplan_gateway::{render_prompt, OutputFormat};
use chrono::{Local, NaiveDate};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "preview_prompt")]
#[command(about = "Print the prompt that would be sent for the given conditions")]
struct Args {
    #[arg(long)]
    conditions: String,

    #[arg(long, default_value = "html")]
    format: OutputFormat,

    #[arg(long, help = "Plan date as YYYY-MM-DD [default: today]")]
    date: Option<NaiveDate>,
}

fn main() {
    let args = Args::parse();
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    println!("{}", render_prompt(&args.conditions, date, args.format));
}

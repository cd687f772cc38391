use clap::{arg,crate_version,Command};
use huffarc::{huffman,STD_OPTIONS};
use std::path::Path;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if Path::new(path_out).exists() {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        return ans.trim_end()=="y" || ans.trim_end()=="Y";
    }
    true
}

/// print symbol for a table row, control characters and non-ASCII bytes as hex
fn printable(symbol: u8) -> String {
    match symbol {
        0x21..=0x7e => (symbol as char).to_string(),
        b' ' => "' '".to_string(),
        _ => format!("{:#04x}",symbol)
    }
}

fn analyze(path_in: &str) -> STDRESULT {
    let mut in_file = match std::fs::File::open(path_in) {
        Ok(f) => f,
        Err(e) if e.kind()==std::io::ErrorKind::NotFound => {
            return Err(Box::new(huffarc::Error::SourceNotFound(path_in.to_string())));
        },
        Err(e) => return Err(Box::new(e))
    };
    let analysis = huffman::analyze(&mut in_file)?;
    println!("symbol probabilities:");
    for (symbol,prob) in analysis.freq.probabilities() {
        println!("{} \t {:.10}",printable(symbol),prob);
    }
    println!();
    println!("symbol count: {}",analysis.freq.total());
    println!("distinct symbols: {}",analysis.freq.distinct());
    println!();
    println!("code table:");
    for (symbol,code) in analysis.codes.iter() {
        println!("{} \t {}",printable(symbol),huffman::code_string(code));
    }
    Ok(())
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `huffarc compress -i my_text.txt -o my_text.huf`
Expand:        `huffarc expand -i my_text.huf -o my_text.txt`
Analyze:       `huffarc analyze -i my_text.txt`";

    let mut main_cmd = Command::new("huffarc")
        .about("Compress and expand text files with static Huffman codes")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    main_cmd = main_cmd.subcommand(Command::new("analyze")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .about("print the symbol probabilities and code table of a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let sum = huffman::compress_file(Path::new(path_in),Path::new(path_out),&STD_OPTIONS)?;
        eprintln!("compressed {} into {}",sum.in_size,sum.out_size);
        eprintln!("compression ratio {:.4}",sum.ratio());
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let sum = huffman::expand_file(Path::new(path_in),Path::new(path_out),&STD_OPTIONS)?;
        eprintln!("expanded {} into {}",sum.in_size,sum.out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("analyze") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        analyze(path_in)?;
    }

    Ok(())
}

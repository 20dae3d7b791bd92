#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use ehgallery::{Config, EhApi};
use getopts::{Matches, Options};
use std::env;

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] GALLERY_URL", program);
    print!("{}", opts.usage(&brief));
}

async fn run(matches: &Matches) -> Result<()> {
    let path = matches
        .opt_str("c")
        .unwrap_or_else(|| "config.toml".to_owned());
    let config = Config::new(&path).with_context(|| format!("读取配置失败: {}", path))?;
    let api = EhApi::from_config(&config)?;

    if matches.opt_present("q") {
        match api.image_limit().await? {
            Some(limit) => println!(
                "图片配额: {} / {}，剩余 {}",
                limit.current,
                limit.max,
                limit.remaining()
            ),
            None => println!("无法获取图片配额"),
        }
    }

    let gallery = api.gallery(&matches.free[0]).await?;
    println!("{}", serde_json::to_string_pretty(&gallery)?);

    if matches.opt_present("o") {
        for (page, original) in api.original_urls(&gallery).await? {
            println!("{} -> {}", page, original);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_module("ehgallery", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("c", "config", "配置文件路径，默认为 config.toml", "FILE");
    opts.optflag("o", "originals", "解析所有图片的原图地址");
    opts.optflag("q", "quota", "显示图片配额");
    opts.optflag("h", "help", "打印帮助信息");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&program, &opts);
            std::process::exit(2);
        }
    };
    if matches.opt_present("h") || matches.free.is_empty() {
        print_usage(&program, &opts);
        return;
    }

    if let Err(e) = run(&matches).await {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

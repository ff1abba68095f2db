use clap::{Arg, ArgAction, Command};
use std::str::FromStr;

use capsim::logging::{init_logging, level_for_verbosity, parse_log_level, LogConfig, LogOutput};
use capsim::scenario::ScenarioConfig;
use capsim::simulation::{EpisodeSummary, SimulationEngine};

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("capsim")
        .version("0.1.0")
        .about("キャプチャーゲーム・エージェント制御シミュレーション")
        .long_about("2チーム対戦のキャプチャー＆リターン・ミニゲームのエージェント制御シミュレーション\n\
                     離散アクション、オートパイロット、報酬シェーピングをエピソード単位で評価します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| level_for_verbosity(verbose_level));
    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        None => LogOutput::Console,
    };
    if let Err(e) = init_logging(LogConfig::new(level, output)) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }

    println!("キャプチャーゲーム・シミュレーション - capsim v0.1.0");
    println!();

    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, info_only: bool, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    scenario.print_summary();
    println!();

    if info_only {
        return Ok(());
    }

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;
    let summaries = simulation.run()?;

    print_results(&summaries);

    Ok(())
}

/// エピソードごとの結果を表示
fn print_results(summaries: &[EpisodeSummary]) {
    println!("=== 実行結果 ===");
    for summary in summaries {
        println!("エピソード {} ({}ティック)", summary.episode, summary.ticks);
        for (name, total) in &summary.rewards {
            println!("  {:<16} 累計報酬: {:>9.3}", name, total);
        }
        for (team, count) in &summary.banked_by_team {
            println!("  チーム{} 収納数: {}", team, count);
        }
        println!(
            "  確保: {}  収納: {}  命中: {}  落下: {}  壁接触: {}",
            summary.stats.pickups,
            summary.stats.banked_targets,
            summary.stats.laser_hits,
            summary.stats.dropped_targets,
            summary.stats.wall_contacts,
        );
    }
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  capsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -v, --verbose            詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL>  ログレベル (trace, debug, info, warn, error)");
    println!("      --log-output <OUT>   ログ出力先 (console, file, both)");
    println!("  -h, --help               このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/capture_basic.yaml   - 1対1の基本対戦");
    println!("  scenarios/scripted_solo.yaml   - 単独エージェントのスクリプト操作");
    println!();
    println!("例:");
    println!("  capsim -s scenarios/capture_basic.yaml");
    println!("  capsim -s scenarios/capture_basic.yaml -vv --log-output both");
    println!("  capsim -s scenarios/scripted_solo.yaml -i");
}

extern crate clap;

use clap::{App, Arg, ArgMatches};
use fillgrid::{find_fill, render_grid, FillOptions, GridConfig, SearchMode, WordList};
use std::fs;

fn app() -> App<'static, 'static> {
    App::new("fillgrid")
        .about("Fill a crossword grid from a word list")
        .arg(
            Arg::with_name("structure")
                .value_name("STRUCTURE")
                .help("Grid template, with _ or . for fillable cells")
                .required(true),
        )
        .arg(
            Arg::with_name("words")
                .value_name("WORDS")
                .help("Word list, one word per line")
                .required(true),
        )
        .arg(
            Arg::with_name("text-output")
                .short("o")
                .long("text-output")
                .value_name("FILE")
                .help("Also write the filled grid to FILE as text"),
        )
        .arg(
            Arg::with_name("interleaved")
                .long("interleaved")
                .takes_value(false)
                .help("Re-establish arc consistency after every choice"),
        )
}

fn fill_options(matches: &ArgMatches) -> FillOptions {
    FillOptions {
        mode: if matches.is_present("interleaved") {
            SearchMode::Interleaved
        } else {
            SearchMode::Plain
        },
    }
}

fn main() -> Result<(), String> {
    env_logger::init();

    let matches = app().get_matches();

    let structure_path = matches.value_of("structure").ok_or("Missing STRUCTURE")?;
    let words_path = matches.value_of("words").ok_or("Missing WORDS")?;

    let options = fill_options(&matches);

    let structure = fs::read_to_string(structure_path)
        .map_err(|err| format!("Failed to read {}: {}", structure_path, err))?;
    let words = fs::read_to_string(words_path)
        .map_err(|err| format!("Failed to read {}: {}", words_path, err))?;

    let grid_config = GridConfig::from_template(&structure)
        .map_err(|err| format!("Failed to parse {}: {}", structure_path, err))?;
    let word_list = WordList::parse(&words);

    match options.mode {
        SearchMode::Plain => println!("Solving with a single arc consistency pass..."),
        SearchMode::Interleaved => {
            println!("Solving with arc consistency interleaved with backtracking...")
        }
    }

    let result = match find_fill(&grid_config, &word_list, &options) {
        Ok(result) => result,
        Err(failure) => {
            println!("No solution.");
            return Err(failure.to_string());
        }
    };

    let display_grid = render_grid(&grid_config, &word_list, &result.assignment);

    println!("{:?}", result.statistics);
    println!("{}", display_grid);

    if let Some(output_path) = matches.value_of("text-output") {
        fs::write(output_path, display_grid + "\n")
            .map_err(|err| format!("Failed to write {}: {}", output_path, err))?;
        println!("written grid to {}", output_path);
    }

    Ok(())
}

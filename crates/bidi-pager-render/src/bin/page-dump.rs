use std::env;
use std::process::ExitCode;

use bidi_pager::{parse_markup, Document, Position};
use bidi_pager_render::{Line, LayoutConfig, Page, PaginationSession, RenderDiagnostic};
use serde::Serialize;

const DEFAULT_MAX_PAGES: usize = 64;

#[derive(Clone, Debug)]
struct Args {
    markup_path: String,
    config_path: Option<String>,
    display_width: Option<i32>,
    display_height: Option<i32>,
    paragraph_gap_px: Option<i32>,
    justify: bool,
    max_pages: usize,
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct DumpLine {
    y: f64,
    height: f64,
    start: usize,
    end: usize,
    text: String,
    /// Words in placement order with their left edge.
    words: Vec<(String, f64)>,
}

#[derive(Debug, Serialize)]
struct DumpPage {
    index: usize,
    top: Position,
    bottom: Position,
    content_height: f64,
    start_of_chapter: bool,
    end_of_chapter: bool,
    lines: Vec<DumpLine>,
}

#[derive(Debug, Default, Serialize)]
struct DumpReport {
    config: Option<LayoutConfig>,
    load_warnings: Vec<String>,
    diagnostics: Vec<String>,
    pages: Vec<DumpPage>,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let source = std::fs::read_to_string(&cli.markup_path)
        .map_err(|e| format!("cannot read '{}': {}", cli.markup_path, e))?;
    let loaded = if cli.markup_path.ends_with(".txt") {
        let (document, diagnostics) = Document::from_plain_text(&source, None);
        bidi_pager::LoadedDocument {
            document,
            diagnostics,
        }
    } else {
        parse_markup(&source).map_err(|e| e.to_string())?
    };
    let cfg = layout_config(&cli)?;

    let mut report = DumpReport {
        config: Some(cfg.clone()),
        load_warnings: loaded.diagnostics.iter().map(|d| d.to_string()).collect(),
        ..DumpReport::default()
    };
    let mut diagnostics: Vec<RenderDiagnostic> = Vec::new();
    {
        let sink = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink_handle = std::rc::Rc::clone(&sink);
        let mut session = PaginationSession::with_config(&loaded.document, cfg);
        session.set_diagnostic_sink(move |d| sink_handle.borrow_mut().push(d));

        let mut page = session.first_page().map_err(|e| e.to_string())?;
        while let Some(current) = page {
            if report.pages.len() >= cli.max_pages {
                break;
            }
            report.pages.push(dump_page(report.pages.len(), &session, &current));
            page = session.build_next_page(&current).map_err(|e| e.to_string())?;
        }
        diagnostics.append(&mut sink.borrow_mut());
    }
    report.diagnostics = diagnostics.iter().map(|d| format!("{:?}", d)).collect();

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn dump_page(index: usize, session: &PaginationSession<'_, Document>, page: &Page) -> DumpPage {
    let lines = page
        .paragraphs
        .iter()
        .flat_map(|part| part.positioned_lines())
        .map(|line| dump_line(&line))
        .collect();
    DumpPage {
        index,
        top: page.top,
        bottom: page.bottom,
        content_height: page.content_height,
        start_of_chapter: session.is_start_of_chapter(page),
        end_of_chapter: session.is_end_of_chapter(page),
        lines,
    }
}

fn dump_line(line: &Line) -> DumpLine {
    DumpLine {
        y: line.location.y,
        height: line.height,
        start: line.range.start,
        end: line.range.end,
        text: line.text(),
        words: line
            .words
            .iter()
            .map(|w| (w.text.clone(), w.bounds.x))
            .collect(),
    }
}

fn layout_config(cli: &Args) -> Result<LayoutConfig, String> {
    let mut cfg = match &cli.config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config '{}': {}", path, e))?;
            serde_json::from_str::<LayoutConfig>(&raw)
                .map_err(|e| format!("invalid config '{}': {}", path, e))?
        }
        None => LayoutConfig::default(),
    };
    if let Some(width) = cli.display_width {
        cfg.display_width = width;
    }
    if let Some(height) = cli.display_height {
        cfg.display_height = height;
    }
    if let Some(gap) = cli.paragraph_gap_px {
        cfg.paragraph_gap_px = gap;
    }
    cfg.justify |= cli.justify;
    Ok(cfg)
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }
    let markup_path = args
        .get(1)
        .filter(|v| !v.starts_with("--"))
        .cloned()
        .ok_or_else(|| "missing markup file".to_string())?;

    let mut cfg = Args {
        markup_path,
        config_path: None,
        display_width: None,
        display_height: None,
        paragraph_gap_px: None,
        justify: false,
        max_pages: DEFAULT_MAX_PAGES,
        pretty: false,
    };

    let mut i = 2usize;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                cfg.config_path = Some(value_of(&args, i)?.to_string());
                i += 2;
            }
            "--width" => {
                cfg.display_width = Some(parse_number(&args, i)?);
                i += 2;
            }
            "--height" => {
                cfg.display_height = Some(parse_number(&args, i)?);
                i += 2;
            }
            "--gap" => {
                cfg.paragraph_gap_px = Some(parse_number(&args, i)?);
                i += 2;
            }
            "--pages" => {
                let v = value_of(&args, i)?;
                cfg.max_pages = v
                    .parse::<usize>()
                    .map_err(|_| format!("invalid --pages value '{}'", v))?;
                i += 2;
            }
            "--justify" => {
                cfg.justify = true;
                i += 1;
            }
            "--pretty" => {
                cfg.pretty = true;
                i += 1;
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(cfg)
}

fn value_of(args: &[String], i: usize) -> Result<&str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", args[i]))
}

fn parse_number(args: &[String], i: usize) -> Result<i32, String> {
    let v = value_of(args, i)?;
    v.parse::<i32>()
        .map_err(|_| format!("invalid {} value '{}'", args[i], v))
}

fn help_text() -> &'static str {
    "usage: page-dump <file.xml|file.txt> [--config layout.json] [--width N] [--height N] \
     [--gap N] [--pages N] [--justify] [--pretty]"
}

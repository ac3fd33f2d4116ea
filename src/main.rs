use chrono::Datelike;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use situatie::config::{
    config_dir, load_config, load_worksheet, resolve_output_dir, save_worksheet,
    worksheet_template, CONFIG_FILE, CONFIG_TEMPLATE, WORKSHEET_FILE,
};
use situatie::logging::init_logging;
use situatie::render::{
    encode_payload, Artifact, Placement, RenderIntent, RenderSummary, RenderedDocument,
    ReportRenderer,
};
use situatie::situation::{Factor, FactorFlags, ItemField, WorkItem, Worksheet, VAT_RATE};
use situatie::{Result, SituationError};

#[derive(Parser)]
#[command(name = "situatie")]
#[command(version, about = "Monthly work situation reports for construction sites", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.situatie or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log layout decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Show the current worksheet and its totals
    Show,

    /// Set report header fields
    Header {
        #[arg(long)]
        beneficiary: Option<String>,

        /// Subcontractor name (also enables the subcontractor field)
        #[arg(long, conflicts_with = "no_subcontractor")]
        subcontractor: Option<String>,

        /// Remove the subcontractor from the report
        #[arg(long)]
        no_subcontractor: bool,

        #[arg(long)]
        site: Option<String>,

        /// Billing period, e.g. "1-31.05"
        #[arg(long)]
        month: Option<String>,

        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        director: Option<String>,

        #[arg(long)]
        executor: Option<String>,

        #[arg(long)]
        site_manager: Option<String>,
    },

    /// Append a blank row
    AddRow {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        unit: Option<String>,
    },

    /// Delete a row; the remaining rows are renumbered
    DeleteRow {
        /// Row number from 'show'
        id: u32,
    },

    /// Edit a row's fields. Figures that are not numbers count as 0.
    EditRow {
        /// Row number from 'show'
        id: u32,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        unit: Option<String>,

        /// Total quantity
        #[arg(long, allow_hyphen_values = true)]
        total_qty: Option<String>,

        /// Quantity (hours) this month
        #[arg(long, allow_hyphen_values = true)]
        month_qty: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        rate: Option<String>,
    },

    /// Toggle whether a figure takes part in a row's value
    Toggle {
        /// Row number from 'show'
        id: u32,

        /// One of: total-qty, month-qty, rate
        factor: String,
    },

    /// Load, include or exclude the footer image
    Image {
        /// PNG or JPEG file to load
        path: Option<PathBuf>,

        /// Keep the loaded image but leave it out of the report
        #[arg(long, conflicts_with_all = ["include", "path"])]
        exclude: bool,

        /// Put a previously loaded image back into the report
        #[arg(long)]
        include: bool,
    },

    /// Lay out the report without producing a PDF
    Inspect {
        /// Print every page's drawing operations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate the report PDF
    Generate {
        /// Build a preview in the temp directory instead of the output directory
        #[arg(long)]
        preview: bool,

        /// Custom output file path (default: output_dir/Situatie_lucrari_...pdf)
        #[arg(short, long, conflicts_with = "preview")]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Show => cmd_show(&cfg_dir),
        Commands::Header {
            beneficiary,
            subcontractor,
            no_subcontractor,
            site,
            month,
            year,
            director,
            executor,
            site_manager,
        } => cmd_header(
            &cfg_dir,
            HeaderUpdate {
                beneficiary,
                subcontractor,
                no_subcontractor,
                site,
                month,
                year,
                director,
                executor,
                site_manager,
            },
        ),
        Commands::AddRow { name, unit } => cmd_add_row(&cfg_dir, name, unit),
        Commands::DeleteRow { id } => cmd_delete_row(&cfg_dir, id),
        Commands::EditRow {
            id,
            name,
            unit,
            total_qty,
            month_qty,
            rate,
        } => {
            let edits = [
                (ItemField::Name, name),
                (ItemField::Unit, unit),
                (ItemField::TotalQuantity, total_qty),
                (ItemField::QuantityThisMonth, month_qty),
                (ItemField::Rate, rate),
            ];
            cmd_edit_row(&cfg_dir, id, &edits)
        }
        Commands::Toggle { id, factor } => cmd_toggle(&cfg_dir, id, &factor),
        Commands::Image {
            path,
            exclude,
            include,
        } => cmd_image(&cfg_dir, path, exclude, include),
        Commands::Inspect { json } => cmd_inspect(&cfg_dir, json),
        Commands::Generate {
            preview,
            output,
            open,
        } => cmd_generate(&cfg_dir, preview, output, open),
    }
}

fn ensure_config_dir(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(SituationError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    Ok(())
}

/// Loads the worksheet, applies `edit` and saves it back.
fn with_worksheet<T>(cfg_dir: &Path, edit: impl FnOnce(&mut Worksheet) -> Result<T>) -> Result<T> {
    ensure_config_dir(cfg_dir)?;
    let mut sheet = load_worksheet(cfg_dir)?;
    let result = edit(&mut sheet)?;
    save_worksheet(cfg_dir, &sheet)?;
    Ok(result)
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(SituationError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    let year = chrono::Local::now().year();

    // Create directories
    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;

    // Write template files
    fs::write(cfg_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join(WORKSHEET_FILE), worksheet_template(year)?)?;

    println!("Initialized situatie config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Fill in the header:   situatie header --beneficiary <name> --site <site> --month <period>");
    println!("  2. Describe the work:    situatie edit-row 1 --name <work> --month-qty <hours> --rate <rate>");
    println!("  3. Review it:            situatie show");
    println!();
    println!("Then generate the report:");
    println!("  situatie generate");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "NR")]
    id: u32,
    #[tabled(rename = "WORK")]
    name: String,
    #[tabled(rename = "UNIT")]
    unit: String,
    #[tabled(rename = "TOTAL QTY")]
    total_quantity: String,
    #[tabled(rename = "MONTH QTY")]
    quantity_this_month: String,
    #[tabled(rename = "RATE")]
    rate: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

impl From<&WorkItem> for ItemRow {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            unit: item.unit.clone(),
            total_quantity: figure(item.total_quantity, item.factors.include_total_quantity),
            quantity_this_month: figure(
                item.quantity_this_month,
                item.factors.include_monthly_quantity,
            ),
            rate: figure(item.rate, item.factors.include_rate),
            value: format!("{:.2}", item.value_this_month),
        }
    }
}

/// Figures left out of the row value are marked with `*`.
fn figure(value: Decimal, enabled: bool) -> String {
    if enabled {
        value.to_string()
    } else {
        format!("{value}*")
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

/// Show the worksheet
fn cmd_show(cfg_dir: &Path) -> Result<()> {
    ensure_config_dir(cfg_dir)?;
    let sheet = load_worksheet(cfg_dir)?;
    let header = &sheet.header;

    println!("Beneficiary:   {}", or_dash(&header.beneficiary));
    if header.has_subcontractor {
        println!("Subcontractor: {}", or_dash(&header.subcontractor));
    }
    println!("Site:          {}", or_dash(&header.site));
    println!(
        "Period:        {}.{}",
        or_dash(&header.month),
        or_dash(&header.year)
    );
    println!("Director:      {}", or_dash(&header.director));
    println!("Executor:      {}", or_dash(&header.executor));
    println!("Site manager:  {}", or_dash(&header.site_manager));
    let image = match (&sheet.image.payload, sheet.image.include) {
        (None, _) => "none",
        (Some(_), true) => "included",
        (Some(_), false) => "loaded, excluded",
    };
    println!("Footer image:  {image}");
    println!();

    let rows: Vec<ItemRow> = sheet.items().iter().map(ItemRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    let totals = sheet.totals();
    let vat_percent = VAT_RATE * Decimal::ONE_HUNDRED;
    println!();
    println!("Total:           {:>12.2} RON", totals.subtotal);
    println!("TVA {:>2}%:        {:>12.2} RON", vat_percent.normalize(), totals.tax);
    println!("Total general:   {:>12.2} RON", totals.grand_total);
    println!("Rest de plata:   {:>12.2} RON", totals.amount_due);

    if sheet
        .items()
        .iter()
        .any(|item| item.factors != FactorFlags::all())
    {
        println!();
        println!("* not counted in the row value");
    }

    Ok(())
}

struct HeaderUpdate {
    beneficiary: Option<String>,
    subcontractor: Option<String>,
    no_subcontractor: bool,
    site: Option<String>,
    month: Option<String>,
    year: Option<String>,
    director: Option<String>,
    executor: Option<String>,
    site_manager: Option<String>,
}

/// Set header fields
fn cmd_header(cfg_dir: &Path, update: HeaderUpdate) -> Result<()> {
    with_worksheet(cfg_dir, |sheet| {
        let header = &mut sheet.header;
        let fields = [
            (&mut header.beneficiary, update.beneficiary),
            (&mut header.site, update.site),
            (&mut header.month, update.month),
            (&mut header.year, update.year),
            (&mut header.director, update.director),
            (&mut header.executor, update.executor),
            (&mut header.site_manager, update.site_manager),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }

        if let Some(subcontractor) = update.subcontractor {
            header.has_subcontractor = true;
            header.subcontractor = subcontractor;
        }
        if update.no_subcontractor {
            header.has_subcontractor = false;
            header.subcontractor.clear();
        }
        Ok(())
    })?;

    println!("Header updated");
    Ok(())
}

/// Append a row
fn cmd_add_row(cfg_dir: &Path, name: Option<String>, unit: Option<String>) -> Result<()> {
    let id = with_worksheet(cfg_dir, |sheet| {
        let id = sheet.add_row();
        if let Some(name) = name {
            sheet.update_field(id, ItemField::Name, &name)?;
        }
        if let Some(unit) = unit {
            sheet.update_field(id, ItemField::Unit, &unit)?;
        }
        Ok(id)
    })?;

    println!("Added row {id}");
    Ok(())
}

/// Delete a row
fn cmd_delete_row(cfg_dir: &Path, id: u32) -> Result<()> {
    let removed = with_worksheet(cfg_dir, |sheet| sheet.delete_row(id))?;

    if removed.name.is_empty() {
        println!("Deleted row {id}");
    } else {
        println!("Deleted row {id} ({})", removed.name);
    }
    Ok(())
}

/// Edit a row
fn cmd_edit_row(cfg_dir: &Path, id: u32, edits: &[(ItemField, Option<String>)]) -> Result<()> {
    let value = with_worksheet(cfg_dir, |sheet| {
        // Fails on unknown rows even when nothing is edited
        sheet.item(id)?;
        for (field, value) in edits {
            if let Some(value) = value {
                sheet.update_field(id, *field, value)?;
            }
        }
        Ok(sheet.item(id)?.value_this_month)
    })?;

    println!("Row {id}: {value:.2} RON");
    Ok(())
}

/// Toggle a factor on a row
fn cmd_toggle(cfg_dir: &Path, id: u32, factor: &str) -> Result<()> {
    let factor: Factor = factor.parse()?;
    let (enabled, value) = with_worksheet(cfg_dir, |sheet| {
        let item = sheet.toggle_factor(id, factor)?;
        Ok((item.factors.is_enabled(factor), item.value_this_month))
    })?;

    let state = if enabled { "counted" } else { "not counted" };
    println!("Row {id}: {factor} {state}, value {value:.2} RON");
    Ok(())
}

/// Load or switch the footer image
fn cmd_image(cfg_dir: &Path, path: Option<PathBuf>, exclude: bool, include: bool) -> Result<()> {
    let payload = match &path {
        Some(path) => {
            let data = std::fs::read(path).map_err(|e| SituationError::ImageRead {
                path: path.clone(),
                source: e,
            })?;
            Some(encode_payload(&data)?)
        }
        None => None,
    };

    let included = with_worksheet(cfg_dir, |sheet| {
        if let Some(payload) = payload {
            sheet.set_image(payload);
        }
        if exclude {
            sheet.set_include_image(false)?;
        }
        if include {
            sheet.set_include_image(true)?;
        }
        Ok(sheet.image.payload.is_some().then_some(sheet.image.include))
    })?;

    match (path, included) {
        (Some(path), _) => println!("Loaded image {}", path.display()),
        (None, Some(true)) => println!("Footer image included"),
        (None, Some(false)) => println!("Footer image excluded"),
        (None, None) => println!("No footer image loaded"),
    }
    Ok(())
}

fn build_renderer(cfg_dir: &Path) -> Result<ReportRenderer> {
    let config = load_config(cfg_dir)?;
    Ok(ReportRenderer::new(
        config.theme.to_theme()?,
        config.layout.planner(),
    ))
}

#[derive(Serialize)]
struct Inspection<'a> {
    summary: &'a RenderSummary,
    document: &'a RenderedDocument,
}

/// Lay out the report and describe the result
fn cmd_inspect(cfg_dir: &Path, json: bool) -> Result<()> {
    ensure_config_dir(cfg_dir)?;
    let renderer = build_renderer(cfg_dir)?;
    let doc = load_worksheet(cfg_dir)?.snapshot()?;

    let (document, summary) = renderer.render_document(&doc);

    if json {
        let inspection = Inspection {
            summary: &summary,
            document: &document,
        };
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    let placement = match summary.placement {
        Placement::SamePage => "same page",
        Placement::NewPage => "new page",
    };
    println!("Table ends at:    {:.2}pt", summary.table_end_y);
    println!("Signature block:  {placement}");
    println!(
        "Footer image:     {}",
        if summary.image_embedded { "embedded" } else { "none" }
    );
    println!("Pages:            {}", summary.pages);
    println!("File name:        {}", doc.file_name("pdf"));

    Ok(())
}

/// Generate the report PDF
fn cmd_generate(cfg_dir: &Path, preview: bool, output: Option<PathBuf>, open: bool) -> Result<()> {
    ensure_config_dir(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let renderer = ReportRenderer::new(config.theme.to_theme()?, config.layout.planner());
    let doc = load_worksheet(cfg_dir)?.snapshot()?;

    let intent = if preview {
        RenderIntent::Preview
    } else {
        RenderIntent::Download
    };
    let output_dir = resolve_output_dir(cfg_dir, &config);

    let pdf_path = match renderer.generate(&doc, intent, &output_dir, output)? {
        Artifact::Preview { file_name, bytes } => {
            let path = std::env::temp_dir().join(file_name);
            std::fs::write(&path, bytes)?;
            println!("Preview: {}", path.display());
            path
        }
        Artifact::Download { path } => {
            println!("Generated {}", path.display());
            path
        }
    };

    if open {
        open_path(&pdf_path)?;
    }

    Ok(())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(pdf_path)
            .spawn()?;
    }
    Ok(())
}

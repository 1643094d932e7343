use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::Style;
use openrouter_companion_core::{
    capability::{Capabilities, SortOrder},
    catalog::{ModelSource, StaticCatalog},
    filter::ModelFilter,
    model::ModelView,
    pricing,
    prompt::{Params, Prompt},
    settings::FilterSettings,
    FileTemplatePrompt, OpenRouterClient, StringTemplatePrompt,
};
use serde::Serialize;
use tracing::Level;

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_free() -> Style   { Style::new().color256(114) }         // green
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_bold() -> Style   { Style::new().bold() }
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn price_str(price: f64) -> String {
    let text = pricing::fmt_per_million(price);
    if price == 0.0 {
        s_free().apply_to(text).to_string()
    } else if price.is_infinite() {
        s_dim().apply_to(text).to_string()
    } else {
        s_price().apply_to(text).to_string()
    }
}

fn fmt_context(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else if n == 0 {
        "-".to_string()
    } else {
        n.to_string()
    }
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "openrouter-companion",
    about = "Filter and sort OpenRouter models by capability and price, render prompt templates",
    version,
    after_help = "examples:\n  \
        openrouter-companion                         (structured-output models, cheapest first)\n  \
        openrouter-companion --image --sort context-desc\n  \
        openrouter-companion --any --sort name-asc --table\n  \
        openrouter-companion --catalog models.json --json\n  \
        openrouter-companion prompt --template 'Hi $name' --var name=Ada\n  \
        openrouter-companion prompt --file system.txt --suffix 'Answer in JSON.'"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    list: ListArgs,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ListArgs {
    /// Require image input.
    #[arg(long)]
    image: bool,

    /// Require structured output (the default when no capability is given).
    #[arg(long)]
    structured: bool,

    /// Require reasoning support.
    #[arg(long)]
    reasoning: bool,

    /// No capability requirement at all.
    #[arg(long, conflicts_with_all = ["image", "structured", "reasoning"])]
    any: bool,

    /// none, price-asc, price-desc, name-asc, name-desc, context-asc, context-desc
    #[arg(long, short, default_value = "price-asc")]
    sort: SortOrder,

    #[arg(long)]
    include_deprecated: bool,

    /// Keep listings whose id differs from their canonical slug.
    #[arg(long)]
    include_variants: bool,

    /// Settings file (TOML). Defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the catalog from a saved JSON file instead of the API.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, short)]
    json: bool,

    #[arg(long, short)]
    table: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a prompt template.
    Prompt {
        /// Template file, read verbatim.
        #[arg(long, short, conflicts_with = "template", required_unless_present = "template")]
        file: Option<PathBuf>,
        /// Inline template with $variables.
        #[arg(long)]
        template: Option<String>,
        /// Template variable, key=value. Repeatable.
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// Leave unresolved $variables in place instead of failing.
        #[arg(long)]
        safe: bool,
        /// Text appended after a blank line.
        #[arg(long)]
        suffix: Option<String>,
        /// Print the template's variables and exit.
        #[arg(long)]
        list_vars: bool,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (k, v) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if k.is_empty() {
        return Err(format!("empty variable name in `{raw}`"));
    }
    Ok((k.to_string(), v.to_string()))
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Prompt {
            file,
            template,
            vars,
            safe,
            suffix,
            list_vars,
        }) => {
            let params: Params = vars.into_iter().collect();
            cmd_prompt(file, template, &params, safe, suffix, list_vars)?;
        }
        None => {
            let args = &cli.list;
            let settings = match &args.config {
                Some(path) => FilterSettings::load(path)?,
                None => FilterSettings::load_default()?,
            };
            match &args.catalog {
                Some(path) => {
                    let filter = ModelFilter::with_settings(StaticCatalog::load(path)?, settings);
                    cmd_list(&filter, args).await?;
                }
                None => {
                    let filter = ModelFilter::with_settings(OpenRouterClient::new(None)?, settings);
                    cmd_list(&filter, args).await?;
                }
            }
        }
    }
    Ok(())
}

// ── Listing ──────────────────────────────────────────────────────────

fn requested_capabilities(args: &ListArgs) -> Capabilities {
    if args.any {
        return Capabilities::NONE;
    }
    let mut caps = Capabilities::NONE;
    if args.image {
        caps |= Capabilities::IMAGE_INPUT;
    }
    if args.structured {
        caps |= Capabilities::STRUCTURED_OUTPUT;
    }
    if args.reasoning {
        caps |= Capabilities::REASONING;
    }
    if caps.is_empty() {
        Capabilities::STRUCTURED_OUTPUT
    } else {
        caps
    }
}

fn describe(caps: Capabilities) -> String {
    if caps.is_empty() {
        return "any capability".to_string();
    }
    let parts: Vec<&str> = caps
        .iter()
        .map(|c| match c {
            Capabilities::IMAGE_INPUT => "image input",
            Capabilities::STRUCTURED_OUTPUT => "structured output",
            _ => "reasoning",
        })
        .collect();
    parts.join(" + ")
}

fn describe_order(order: SortOrder) -> &'static str {
    match order {
        SortOrder::None => "catalog order",
        SortOrder::PriceAsc => "cheapest first",
        SortOrder::PriceDesc => "most expensive first",
        SortOrder::NameAsc => "by name",
        SortOrder::NameDesc => "by name, descending",
        SortOrder::ContextAsc => "smallest context first",
        SortOrder::ContextDesc => "largest context first",
    }
}

fn capability_list(m: &ModelView, settings: &FilterSettings) -> Vec<String> {
    let mut out = Vec::new();
    if m.supports_images() {
        out.push("image-input".to_string());
    }
    let structured = m.structured_output_params();
    if !structured.is_empty() {
        out.push(format!("structured-output ({})", structured.join(", ")));
    }
    if m.supports_parameter(&settings.reasoning_marker) {
        out.push("reasoning".to_string());
    }
    out
}

#[derive(Serialize)]
struct ModelSummary<'a> {
    id: &'a str,
    name: Option<&'a str>,
    price_per_million: Option<f64>,
    image_price: Option<f64>,
    context_length: Option<u64>,
    capabilities: Vec<String>,
    created: Option<String>,
}

impl<'a> ModelSummary<'a> {
    fn new(m: &'a ModelView, settings: &FilterSettings) -> Self {
        Self {
            id: m.id(),
            name: m.name(),
            price_per_million: Some(m.price_per_million_tokens()).filter(|p| p.is_finite()),
            image_price: m.image_price(),
            context_length: m.context_length(),
            capabilities: capability_list(m, settings),
            created: m.created_at().map(|t| t.format("%Y-%m-%d").to_string()),
        }
    }
}

async fn cmd_list<S: ModelSource>(
    filter: &ModelFilter<S>,
    args: &ListArgs,
) -> anyhow::Result<()> {
    let caps = requested_capabilities(args);
    let settings = filter.settings();
    let include_deprecated = args.include_deprecated || settings.include_deprecated;
    let include_variants = args.include_variants || settings.include_problematic_variants;

    if !args.json {
        println!(
            "{}",
            s_dim().apply_to(format!(
                "Finding models that support {} ({})...",
                describe(caps),
                describe_order(args.sort)
            ))
        );
    }

    let models = filter
        .filter_models(caps, include_deprecated, include_variants, args.sort)
        .await?;

    if args.json {
        let out: Vec<ModelSummary> = models
            .iter()
            .map(|m| ModelSummary::new(m, settings))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "{}",
        s_header().apply_to(format!(
            "Found {} models that support {}",
            models.len(),
            describe(caps)
        ))
    );
    println!("{}", sep(64));

    if args.table {
        print_table(&models, settings);
    } else {
        for m in &models {
            print_model(m, settings);
        }
    }

    println!("{}", sep(64));
    print_summary(&models);

    // Second query only to count what the deprecation filter removed.
    if !include_deprecated {
        let all = filter
            .filter_models(caps, true, include_variants, SortOrder::None)
            .await?;
        let deprecated = all.len().saturating_sub(models.len());
        if deprecated > 0 {
            println!(
                "- {} additional deprecated models were filtered out",
                s_bold().apply_to(deprecated)
            );
        }
    }
    Ok(())
}

fn print_model(m: &ModelView, settings: &FilterSettings) {
    println!("{} {}", s_tree().apply_to("-"), s_bold().apply_to(m.id()));
    if let Some(name) = m.name().filter(|n| !n.is_empty()) {
        println!("  {} {}", s_label().apply_to("Name:"), name);
    }
    println!(
        "  {} {}",
        s_label().apply_to("Price:"),
        price_str(m.price_per_million_tokens())
    );
    if let Some(img) = m.image_price() {
        println!(
            "  {} {}",
            s_label().apply_to("Image:"),
            s_price().apply_to(format!("${img:.4} per image"))
        );
    }
    if m.sort_context_length() > 0 {
        println!(
            "  {} {}",
            s_label().apply_to("Context:"),
            fmt_context(m.sort_context_length())
        );
    }
    let caps = capability_list(m, settings);
    if !caps.is_empty() {
        println!("  {} {}", s_label().apply_to("Supports:"), caps.join(", "));
    }
    println!();
}

fn print_table(models: &[ModelView], settings: &FilterSettings) {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["model", "$/1M in", "context", "supports", "added"]);
    for m in models {
        let price = m.price_per_million_tokens();
        let price_cell = if price.is_infinite() {
            Cell::new("-").fg(Color::AnsiValue(248))
        } else if price == 0.0 {
            Cell::new("free").fg(Color::AnsiValue(114))
        } else {
            Cell::new(format!("${price:.2}")).fg(Color::AnsiValue(109))
        };
        table.add_row(vec![
            Cell::new(m.id()),
            price_cell,
            Cell::new(fmt_context(m.sort_context_length())),
            Cell::new(capability_list(m, settings).join(", ")),
            Cell::new(
                m.created_at()
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            )
            .fg(Color::AnsiValue(245)),
        ]);
    }
    println!("{table}");
}

fn print_summary(models: &[ModelView]) {
    println!("Total: {} models", s_bold().apply_to(models.len()));

    let free = models.iter().filter(|m| m.is_free()).count();
    if free > 0 {
        println!("- {} are {}", free, s_free().apply_to("FREE"));
    }

    let cheapest_paid = models
        .iter()
        .filter(|m| m.has_pricing() && !m.is_free())
        .min_by(|a, b| {
            a.price_per_million_tokens()
                .total_cmp(&b.price_per_million_tokens())
        });
    if let Some(c) = cheapest_paid {
        println!(
            "- Cheapest paid model: {} at {}",
            s_bold().apply_to(c.id()),
            s_price().apply_to(format!("${:.2}/1M tokens", c.price_per_million_tokens()))
        );
    }

    let unpriced = models.iter().filter(|m| !m.has_pricing()).count();
    if unpriced > 0 {
        println!("- {} have no pricing information", unpriced);
    }
}

// ── Prompt ───────────────────────────────────────────────────────────

fn cmd_prompt(
    file: Option<PathBuf>,
    template: Option<String>,
    params: &Params,
    safe: bool,
    suffix: Option<String>,
    list_vars: bool,
) -> anyhow::Result<()> {
    let suffix = suffix.unwrap_or_default();

    if let Some(path) = file {
        let prompt = FileTemplatePrompt::new(path).with_suffix(suffix);
        if list_vars {
            eprintln!("{}", s_dim().apply_to("file templates have no variables"));
            return Ok(());
        }
        prompt.validate_params(params)?;
        println!("{}", prompt.render(params)?);
        return Ok(());
    }

    let Some(template) = template else {
        anyhow::bail!("pass --file or --template");
    };
    let prompt = StringTemplatePrompt::new(template).with_suffix(suffix);
    if list_vars {
        for v in prompt.required_params() {
            println!("{v}");
        }
        return Ok(());
    }
    let text = if safe {
        prompt.safe_render(params)
    } else {
        prompt.render(params)?
    };
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args(argv: &[&str]) -> ListArgs {
        let mut full = vec!["openrouter-companion"];
        full.extend_from_slice(argv);
        Cli::parse_from(full).list
    }

    #[test]
    fn default_is_structured_output_by_price() {
        let args = list_args(&[]);
        assert_eq!(requested_capabilities(&args), Capabilities::STRUCTURED_OUTPUT);
        assert_eq!(args.sort, SortOrder::PriceAsc);
        assert!(!args.include_deprecated);
    }

    #[test]
    fn flags_combine() {
        let args = list_args(&["--image", "--reasoning", "--sort", "context-desc"]);
        assert_eq!(
            requested_capabilities(&args),
            Capabilities::IMAGE_INPUT | Capabilities::REASONING
        );
        assert_eq!(args.sort, SortOrder::ContextDesc);
        assert_eq!(requested_capabilities(&list_args(&["--any"])), Capabilities::NONE);
    }

    #[test]
    fn any_conflicts_with_capabilities() {
        assert!(Cli::try_parse_from(["openrouter-companion", "--any", "--image"]).is_err());
    }

    #[test]
    fn parse_var_splits_on_first_equals() {
        assert_eq!(parse_var("q=a=b"), Ok(("q".into(), "a=b".into())));
        assert_eq!(parse_var("empty="), Ok(("empty".into(), String::new())));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn prompt_without_source_is_an_error() {
        let err = cmd_prompt(None, None, &Params::new(), false, None, false).unwrap_err();
        assert!(err.to_string().contains("--file or --template"));
    }

    #[test]
    fn prompt_strict_render_propagates_failures() {
        let template = Some("price $5".to_string());
        assert!(cmd_prompt(None, template, &Params::new(), false, None, false).is_err());
    }

    #[test]
    fn fmt_context_units() {
        assert_eq!(fmt_context(0), "-");
        assert_eq!(fmt_context(512), "512");
        assert_eq!(fmt_context(128_000), "128k");
        assert_eq!(fmt_context(2_000_000), "2.0M");
    }
}

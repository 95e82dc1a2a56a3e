//! Command-line front end for the family tree core.
//!
//! # Responsibility
//! - Map subcommands onto `FamilyTreeService` use cases.
//! - Render lists, statistics and the tree as plain text.
//!
//! # Invariants
//! - Every command opens storage, runs once and exits; auto-save persists.
//! - Notices go to stderr so stdout stays scriptable (`export -` pipes JSON).

use clap::{Parser, Subcommand, ValueEnum};
use famtree_core::{
    init_logging, CoreConfig, FamilyTreeService, Gender, MemberDraft, MemberPatch, NoticeLevel,
    SortKey, SqliteKeyValueStore, Theme, TreeNode,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use termtree::Tree;

type Service = FamilyTreeService<SqliteKeyValueStore>;

/// Build and browse a family tree stored in a local SQLite file
#[derive(Parser, Debug)]
#[command(name = "famtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database file (default: FAMTREE_DB_PATH or <temp>/famtree.sqlite3)
    #[arg(long, global = true, env = "FAMTREE_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check core linkage
    Ping,
    /// Add a member
    Add(MemberArgs),
    /// Update fields of a member; an empty relation id clears it
    Update {
        id: String,
        #[command(flatten)]
        fields: MemberArgs,
    },
    /// Delete a member and unlink every reference to it
    Delete { id: String },
    /// Show one member with resolved relations
    Show { id: String },
    /// List members
    List {
        /// Case-insensitive match on name or occupation
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
    },
    /// Print the tree
    Tree,
    /// Print member and generation counts
    Stats,
    /// Toggle collapse state of one member's subtree
    Collapse { id: String },
    /// Expand every subtree
    ExpandAll,
    /// Collapse every subtree
    CollapseAll,
    /// Set the theme, or toggle it when omitted
    Theme {
        #[arg(value_enum)]
        theme: Option<ThemeArg>,
    },
    /// Write an export document (`-` for stdout)
    Export {
        /// Output path (default: family-tree-YYYY-MM-DD.json)
        out: Option<PathBuf>,
    },
    /// Replace all members with the ones in an export document
    Import { file: PathBuf },
    /// Load the sample family into an empty tree
    Sample,
    /// Remove every member
    Clear,
    /// Drop dangling and self references
    Repair,
}

#[derive(clap::Args, Debug, Default)]
struct MemberArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long, value_enum)]
    gender: Option<GenderArg>,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    dob: Option<String>,
    #[arg(long)]
    birth_place: Option<String>,
    #[arg(long)]
    occupation: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    father: Option<String>,
    #[arg(long)]
    mother: Option<String>,
    #[arg(long)]
    spouse: Option<String>,
    /// Child id; repeat for several children
    #[arg(long = "child")]
    children: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GenderArg {
    Male,
    Female,
    Other,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Name,
    Dob,
    Gender,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<GenderArg> for Gender {
    fn from(value: GenderArg) -> Self {
        match value {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
            GenderArg::Other => Gender::Other,
        }
    }
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => SortKey::Name,
            SortArg::Dob => SortKey::Dob,
            SortArg::Gender => SortKey::Gender,
        }
    }
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

impl MemberArgs {
    fn into_draft(self) -> MemberDraft {
        MemberDraft {
            name: self.name.unwrap_or_default(),
            gender: self.gender.map(Gender::from),
            dob: self.dob,
            birth_place: self.birth_place,
            occupation: self.occupation,
            email: self.email,
            bio: self.bio,
            photo: None,
            spouse: self.spouse,
            father: self.father,
            mother: self.mother,
            children: self.children,
        }
    }

    fn into_patch(self) -> MemberPatch {
        MemberPatch {
            name: self.name,
            gender: self.gender.map(Gender::from),
            dob: self.dob,
            birth_place: self.birth_place,
            occupation: self.occupation,
            email: self.email,
            bio: self.bio,
            photo: None,
            spouse: self.spouse.map(Some),
            father: self.father.map(Some),
            mother: self.mother.map(Some),
            children: (!self.children.is_empty()).then_some(self.children),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = CoreConfig::from_env();
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_ref().and_then(|dir| dir.to_str()) {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    if let Commands::Ping = cli.command {
        println!("famtree_core ping={}", famtree_core::ping());
        println!("famtree_core version={}", famtree_core::core_version());
        return ExitCode::SUCCESS;
    }

    let kv = match SqliteKeyValueStore::open(&config.db_path) {
        Ok(kv) => kv,
        Err(err) => {
            eprintln!("error: cannot open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };
    let mut service = FamilyTreeService::open(kv);
    let result = run(&mut service, cli.command);
    print_notices(&mut service);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(service: &mut Service, command: Commands) -> Result<(), String> {
    let name = command_name(&command);
    match command {
        Commands::Ping => {}
        Commands::Add(fields) => {
            let member = service
                .create_member(fields.into_draft())
                .map_err(|err| err.to_string())?;
            println!("{}", member.id);
        }
        Commands::Update { id, fields } => {
            service
                .update_member(&id, fields.into_patch())
                .map_err(|err| err.to_string())?;
        }
        Commands::Delete { id } => {
            if service.delete_member(&id).is_none() {
                eprintln!("no member with id {id}");
            }
        }
        Commands::Show { id } => {
            let details = service
                .member_details(&id, service.today())
                .map_err(|err| err.to_string())?;
            let member = &details.member;
            println!("{} ({})", member.name, member.gender);
            print_field("id", &member.id);
            print_field("born", &member.dob);
            if let Some(age) = details.age {
                print_field("age", &age.to_string());
            }
            print_field("birth place", &member.birth_place);
            print_field("occupation", &member.occupation);
            print_field("email", &member.email);
            print_field("father", details.father_name.as_deref().unwrap_or(""));
            print_field("mother", details.mother_name.as_deref().unwrap_or(""));
            print_field("spouse", details.spouse_name.as_deref().unwrap_or(""));
            print_field("children", &details.children_names.join(", "));
            print_field("bio", &member.bio);
        }
        Commands::List { search, sort } => {
            let cards = service.member_cards(&search, sort.into(), service.today());
            for card in cards {
                let age = card.age.map(|age| format!("{age}y")).unwrap_or_default();
                println!(
                    "{:<34} {:<2} {:<24} {:<6} {:<4} {}",
                    card.id, card.initials, card.name, card.gender, age, card.occupation
                );
            }
        }
        Commands::Tree => {
            let forest = service.tree();
            if forest.is_empty() {
                println!("(empty tree)");
            } else {
                let leaves: Vec<Tree<String>> = forest.iter().map(to_term_tree).collect();
                print!("{}", Tree::new("Family".to_string()).with_leaves(leaves));
            }
        }
        Commands::Stats => {
            let stats = service.stats();
            println!(
                "members={} male={} female={} other={} generations={}",
                stats.total, stats.male, stats.female, stats.other, stats.generations
            );
        }
        Commands::Collapse { id } => {
            let collapsed = service
                .toggle_collapsed(&id)
                .map_err(|err| err.to_string())?;
            println!("{}", if collapsed { "collapsed" } else { "expanded" });
        }
        Commands::ExpandAll => service.expand_all(),
        Commands::CollapseAll => service.collapse_all(),
        Commands::Theme { theme } => {
            let theme = match theme {
                Some(theme) => {
                    service.set_theme(theme.into());
                    theme.into()
                }
                None => service.toggle_theme(),
            };
            println!("{theme}");
        }
        Commands::Export { out } => {
            let snapshot = service.export_json().map_err(|err| err.to_string())?;
            match out {
                Some(path) if path.as_os_str() == "-" => println!("{}", snapshot.contents),
                out => {
                    let path = out.unwrap_or_else(|| PathBuf::from(&snapshot.file_name));
                    std::fs::write(&path, snapshot.contents)
                        .map_err(|err| format!("cannot write {}: {err}", path.display()))?;
                    println!("{}", path.display());
                }
            }
        }
        Commands::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .map_err(|err| format!("cannot read {}: {err}", file.display()))?;
            service
                .import_json(&contents)
                .map_err(|err| err.to_string())?;
        }
        Commands::Sample => {
            if !service.seed_sample_if_empty() {
                eprintln!("tree is not empty; sample not loaded");
            }
        }
        Commands::Clear => service.clear_all(),
        Commands::Repair => {
            let report = service.repair_references();
            println!(
                "dangling_removed={} self_references_removed={}",
                report.dangling_removed, report.self_references_removed
            );
        }
    }
    info!("event=cli_command module=cli status=ok command={name}");
    Ok(())
}

fn to_term_tree(node: &TreeNode) -> Tree<String> {
    let mut label = format!("{} ({})", node.member.name, node.member.gender);
    if node.collapsed && !node.member.children.is_empty() {
        label.push_str(" [+]");
    }
    if node.cycle_truncated {
        label.push_str(" [cycle]");
    }
    Tree::new(label).with_leaves(node.child_nodes().iter().map(to_term_tree))
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {label:<12} {value}");
    }
}

fn print_notices(service: &mut Service) {
    for notice in service.drain_notices() {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{prefix}] {}", notice.message);
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Ping => "ping",
        Commands::Add(_) => "add",
        Commands::Update { .. } => "update",
        Commands::Delete { .. } => "delete",
        Commands::Show { .. } => "show",
        Commands::List { .. } => "list",
        Commands::Tree => "tree",
        Commands::Stats => "stats",
        Commands::Collapse { .. } => "collapse",
        Commands::ExpandAll => "expand-all",
        Commands::CollapseAll => "collapse-all",
        Commands::Theme { .. } => "theme",
        Commands::Export { .. } => "export",
        Commands::Import { .. } => "import",
        Commands::Sample => "sample",
        Commands::Clear => "clear",
        Commands::Repair => "repair",
    }
}

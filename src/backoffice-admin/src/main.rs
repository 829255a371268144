//! Backoffice admin CLI: provider dashboard, organization and user
//! management, and the pricing table.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use backoffice_admin_console::organization_ops::{
    NewMember, NewOrganization, OrganizationFilter, OrganizationPatch,
};
use backoffice_admin_console::provider_dashboard::{DashboardSnapshot, OrganizationDetail};
use backoffice_admin_console::user_ops::{NewUser, UserFilter, UserPatch};
use backoffice_admin_console::{AdminConsole, DashboardQuery};
use backoffice_billing::{format_plan, format_price, PricingTable};
use backoffice_core::config::AppConfig;
use backoffice_core::types::{
    split_full_name, CustomDateRange, DateFilter, LoginStatus, Organization, OrganizationStatus,
    Plan, SubscriptionType, User, UserStatus,
};
use backoffice_reporting::activity::format_duration;

#[derive(Parser)]
#[command(name = "backoffice-admin")]
#[command(about = "Backoffice administration: dashboard, organizations, users, pricing")]
#[command(version)]
struct Cli {
    /// Print results and logs as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// JSON file holding records created through the console (overrides config)
    #[arg(long, global = true, env = "BACKOFFICE__STORAGE__DATA_FILE")]
    data_file: Option<String>,

    /// Start without the demo organizations and users
    #[arg(long, global = true, default_value_t = false)]
    no_sample_data: bool,

    /// Reporting timezone offset from UTC in minutes (overrides config)
    #[arg(long, global = true, allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Organization and user totals, growth and recurring revenue for a period
    Dashboard {
        /// today, week, month, quarter, year, all or custom (default from config)
        #[arg(short, long)]
        period: Option<DateFilter>,

        /// First day of a custom range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day of a custom range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Manage organizations
    Orgs {
        #[command(subcommand)]
        action: OrgAction,
    },

    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Show the price per seat of every plan
    Pricing,
}

#[derive(Subcommand)]
enum OrgAction {
    /// List organizations
    List {
        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<OrganizationStatus>,

        #[arg(long)]
        plan: Option<Plan>,
    },

    /// Show an organization with its users, login history and engagement
    Show {
        id: Uuid,

        /// Login log filter
        #[arg(long, value_enum, default_value_t = LogFilter::All)]
        logs: LogFilter,
    },

    /// Create an organization, optionally with its first user
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(long, default_value = "0")]
        seats: u32,

        /// free or pro
        #[arg(long, default_value = "free")]
        plan: Plan,

        /// monthly or yearly (Pro only)
        #[arg(long)]
        subscription: Option<SubscriptionType>,

        #[arg(long, default_value = "active")]
        status: OrganizationStatus,

        /// First name of the initial user
        #[arg(long)]
        user_first: Option<String>,

        /// Last name of the initial user
        #[arg(long)]
        user_last: Option<String>,

        /// Email of the initial user
        #[arg(long)]
        user_email: Option<String>,
    },

    /// Edit an organization; MRR is recomputed
    Update {
        id: Uuid,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        seats: Option<u32>,

        #[arg(long)]
        plan: Option<Plan>,

        #[arg(long)]
        subscription: Option<SubscriptionType>,

        #[arg(long)]
        status: Option<OrganizationStatus>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users
    List {
        /// Case-insensitive search on name, email and organization
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        plan: Option<Plan>,

        #[arg(long)]
        status: Option<UserStatus>,
    },

    /// Show a user
    Show { id: Uuid },

    /// Create a user in an existing organization
    Create {
        /// Full name, split into first and last name
        #[arg(long, conflicts_with_all = ["first", "last"])]
        name: Option<String>,

        #[arg(long)]
        first: Option<String>,

        #[arg(long)]
        last: Option<String>,

        #[arg(short, long)]
        email: String,

        /// Organization name
        #[arg(short, long)]
        org: String,

        #[arg(long, default_value = "active")]
        status: UserStatus,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Edit a user
    Update {
        id: Uuid,

        #[arg(long)]
        first: Option<String>,

        #[arg(long)]
        last: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Move the user to another organization
        #[arg(short, long)]
        org: Option<String>,

        #[arg(long)]
        status: Option<UserStatus>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFilter {
    All,
    Success,
    Failed,
}

impl LogFilter {
    fn status(self) -> Option<LoginStatus> {
        match self {
            Self::All => None,
            Self::Success => Some(LoginStatus::Success),
            Self::Failed => Some(LoginStatus::Failed),
        }
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backoffice_admin=info,backoffice_admin_console=info".into()),
        )
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(path) = cli.data_file {
        config.storage.data_file = Some(path);
    }
    if cli.no_sample_data {
        config.storage.seed_sample_data = false;
    }
    if let Some(minutes) = cli.utc_offset {
        config.reporting.utc_offset_minutes = minutes;
    }

    info!(
        data_file = config.storage.data_file.as_deref().unwrap_or("-"),
        seed_sample_data = config.storage.seed_sample_data,
        utc_offset_minutes = config.reporting.utc_offset_minutes,
        "Backoffice admin starting"
    );

    let console = AdminConsole::from_config(&config).context("Failed to set up the console")?;
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Dashboard { period, from, to } => {
            cmd_dashboard(&console, &config, &out, period, from.zip(to)).await
        }
        Commands::Orgs { action } => cmd_orgs(&console, &out, action).await,
        Commands::Users { action } => cmd_users(&console, &out, action).await,
        Commands::Pricing => cmd_pricing(&out),
    }
}

// ─── Output ─────────────────────────────────────────────────────────────

struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON, or fall back to the human-readable renderer.
    fn emit<T: Serialize>(&self, value: &T, render: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }
}

fn print_org_table(orgs: &[Organization]) {
    println!(
        "  {:<36}  {:<20} {:<14} {:>5} {:>8} {:<8} {}",
        "ID", "NAME", "PLAN", "SEATS", "MRR", "STATUS", "CREATED"
    );
    for o in orgs {
        println!(
            "  {:<36}  {:<20} {:<14} {:>5} {:>8} {:<8} {}",
            o.id,
            o.name,
            format_plan(o.plan, o.subscription_type),
            o.seat_count,
            format_price(o.mrr),
            if o.is_active() { "active" } else { "inactive" },
            o.created_at.format("%Y-%m-%d"),
        );
    }
    println!();
    println!("  {} organization(s)", orgs.len());
}

fn print_user_table(users: &[User]) {
    println!(
        "  {:<36}  {:<24} {:<34} {:<16} {:<5} {}",
        "ID", "NAME", "EMAIL", "ORGANIZATION", "PLAN", "STATUS"
    );
    for u in users {
        println!(
            "  {:<36}  {:<24} {:<34} {:<16} {:<5} {:?}",
            u.id,
            u.full_name(),
            u.email,
            u.company,
            u.plan.to_string(),
            u.status,
        );
    }
    println!();
    println!("  {} user(s)", users.len());
}

fn print_org(o: &Organization) {
    println!("  ID:           {}", o.id);
    println!("  Name:         {}", o.name);
    println!("  Plan:         {}", format_plan(o.plan, o.subscription_type));
    println!("  Seats:        {}", o.seat_count);
    println!("  MRR:          {}", format_price(o.mrr));
    println!("  ARR:          {}", format_price(o.mrr * 12));
    println!("  Status:       {}", if o.is_active() { "active" } else { "inactive" });
    println!("  Created:      {}", o.created_at.format("%Y-%m-%d"));
}

fn print_user(u: &User) {
    println!("  ID:           {}", u.id);
    println!("  Name:         {}", u.full_name());
    println!("  Email:        {}", u.email);
    println!("  Organization: {}", u.company);
    println!("  Plan:         {}", u.plan);
    println!("  Status:       {:?}", u.status);
    println!("  Created:      {}", u.created_at.format("%Y-%m-%d"));
    if let Some(phone) = &u.phone {
        println!("  Phone:        {phone}");
    }
    if let Some(address) = &u.address {
        println!("  Address:      {address}");
    }
    if let Some(last_login) = u.last_login {
        println!("  Last login:   {}", last_login.format("%Y-%m-%d %H:%M"));
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

async fn cmd_dashboard(
    console: &AdminConsole,
    config: &AppConfig,
    out: &Output,
    period: Option<DateFilter>,
    dates: Option<(NaiveDate, NaiveDate)>,
) -> anyhow::Result<()> {
    let custom_range = match dates {
        Some((from, to)) => Some(CustomDateRange::from_dates(
            from,
            to,
            config.reporting.utc_offset()?,
        )?),
        None => None,
    };
    let period = resolve_period(period, custom_range.is_some(), config.reporting.default_period)?;

    let snapshot = console
        .dashboard
        .snapshot(DashboardQuery {
            period,
            custom_range,
        })
        .await?;

    out.emit(&snapshot, |s: &DashboardSnapshot| {
        println!("=== Backoffice Dashboard: {} ===", s.period_label);
        println!();
        println!("  Organizations");
        println!("    Active:          {}", s.stats.total_organizations);
        println!("    New in period:   {}", s.stats.new_organizations_in_period);
        println!("    Growth:          {:.1}%", s.stats.growth_rate);
        println!();
        println!("  Users");
        println!("    Total:           {}", s.stats.total_users);
        println!("    Active:          {}", s.stats.active_users);
        println!();
        println!("  Revenue");
        println!("    MRR:             {}", format_price(s.revenue.mrr));
        println!("    ARR:             {}", format_price(s.revenue.arr));
        println!();
        println!("  Generated at {}", s.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    })
}

/// Dates imply the custom period; a named period cannot take them.
fn resolve_period(
    period: Option<DateFilter>,
    has_range: bool,
    default: DateFilter,
) -> anyhow::Result<DateFilter> {
    match (period, has_range) {
        (Some(DateFilter::Custom), _) | (None, true) => Ok(DateFilter::Custom),
        (Some(period), true) => {
            anyhow::bail!("--from/--to only apply to the custom period, not '{period}'")
        }
        (Some(period), false) => Ok(period),
        (None, false) => Ok(default),
    }
}

async fn cmd_orgs(console: &AdminConsole, out: &Output, action: OrgAction) -> anyhow::Result<()> {
    let ops = &console.organizations;
    match action {
        OrgAction::List {
            search,
            status,
            plan,
        } => {
            let filter = OrganizationFilter {
                search,
                status,
                plan,
            };
            let orgs = ops.list(&filter).await?;
            out.emit(&orgs, |orgs: &Vec<Organization>| print_org_table(orgs))
        }
        OrgAction::Show { id, logs } => {
            let detail = console
                .dashboard
                .organization_detail(id, logs.status())
                .await?;
            out.emit(&detail, print_org_detail)
        }
        OrgAction::Create {
            name,
            seats,
            plan,
            subscription,
            status,
            user_first,
            user_last,
            user_email,
        } => {
            let input = NewOrganization {
                name,
                seat_count: seats,
                status,
                plan,
                subscription_type: subscription,
            };
            if user_first.is_none() && user_last.is_none() && user_email.is_none() {
                let org = ops.create(input).await?;
                return out.emit(&org, |o: &Organization| {
                    println!("Organization created");
                    print_org(o);
                });
            }

            let member = NewMember {
                first_name: user_first.unwrap_or_default(),
                last_name: user_last.unwrap_or_default(),
                email: user_email.unwrap_or_default(),
                status: UserStatus::Active,
            };
            let created = ops.create_with_member(input, member).await?;
            out.emit(&created, |(o, u): &(Organization, User)| {
                println!("Organization created");
                print_org(o);
                println!();
                println!("  First user:   {} <{}>", u.full_name(), u.email);
            })
        }
        OrgAction::Update {
            id,
            name,
            seats,
            plan,
            subscription,
            status,
        } => {
            let patch = OrganizationPatch {
                name,
                seat_count: seats,
                status,
                plan,
                subscription_type: subscription,
            };
            let org = ops.update(id, patch).await?;
            out.emit(&org, |o: &Organization| {
                println!("Organization updated");
                print_org(o);
            })
        }
    }
}

fn print_org_detail(d: &OrganizationDetail) {
    println!("=== {} ===", d.organization.name);
    println!();
    print_org(&d.organization);
    println!();
    println!("  Users ({})", d.users.len());
    for u in &d.users {
        println!("    {:<24} {:<34} {:?}", u.full_name(), u.email, u.status);
    }
    println!();
    println!("  Login history ({})", d.login_logs.len());
    for log in &d.login_logs {
        println!(
            "    {}  {:<24} {:<15} {:<20} {:<8} {}",
            log.login_at.format("%Y-%m-%d %H:%M"),
            format!("{} {}", log.user_first_name, log.user_last_name),
            log.ip_address,
            log.location.as_deref().unwrap_or("-"),
            match log.status {
                LoginStatus::Success => "success",
                LoginStatus::Failed => "failed",
            },
            log.session_duration.map(format_duration).unwrap_or_else(|| "-".into()),
        );
    }
    println!();
    println!("  Activity");
    for a in &d.activities {
        println!(
            "    {:<24} logins {:>3}  time {:>10}  actions {:>4}  expenses {:>4}",
            format!("{} {}", a.user_first_name, a.user_last_name),
            a.login_count,
            format_duration(a.total_session_time),
            a.actions_count,
            a.expenses_added,
        );
    }
    println!();
    let e = &d.engagement;
    println!("  Engagement");
    println!("    Daily / weekly / monthly active: {} / {} / {}", e.daily_active_users, e.weekly_active_users, e.monthly_active_users);
    println!("    Sessions per user:  {:.1}", e.average_sessions_per_user);
    println!("    Session duration:   {}", format_duration(e.average_session_duration));
    println!("    Busiest:            {} at {}h", e.most_active_day, e.most_active_hour);
    for f in &e.top_features {
        println!("    {:<20} {}", f.feature, f.usage_count);
    }
}

async fn cmd_users(console: &AdminConsole, out: &Output, action: UserAction) -> anyhow::Result<()> {
    let ops = &console.users;
    match action {
        UserAction::List {
            search,
            plan,
            status,
        } => {
            let filter = UserFilter {
                search,
                plan,
                status,
            };
            let users = ops.list(&filter).await?;
            out.emit(&users, |users: &Vec<User>| print_user_table(users))
        }
        UserAction::Show { id } => {
            let user = ops.get(id).await?;
            out.emit(&user, print_user)
        }
        UserAction::Create {
            name,
            first,
            last,
            email,
            org,
            status,
            phone,
            address,
        } => {
            let (first_name, last_name) = match name {
                Some(full) => split_full_name(&full),
                None => (first.unwrap_or_default(), last.unwrap_or_default()),
            };
            let user = ops
                .create(NewUser {
                    first_name,
                    last_name,
                    email,
                    organization: org,
                    status,
                    phone,
                    address,
                })
                .await?;
            out.emit(&user, |u: &User| {
                println!("User created");
                print_user(u);
            })
        }
        UserAction::Update {
            id,
            first,
            last,
            email,
            org,
            status,
            phone,
            address,
        } => {
            let patch = UserPatch {
                first_name: first,
                last_name: last,
                email,
                organization: org,
                status,
                phone,
                address,
            };
            let user = ops.update(id, patch).await?;
            out.emit(&user, |u: &User| {
                println!("User updated");
                print_user(u);
            })
        }
    }
}

fn cmd_pricing(out: &Output) -> anyhow::Result<()> {
    let entries = PricingTable::STANDARD.entries();
    out.emit(&entries, |entries| {
        println!("Price per seat per month:");
        println!();
        for e in entries {
            println!(
                "  {:<16} {:>5}",
                format_plan(e.plan, e.subscription_type),
                format_price(e.price_per_seat)
            );
        }
        println!();
        println!("  MRR = price per seat x seats; Free plans never generate revenue.");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dashboard_custom_dates() {
        let cli = Cli::try_parse_from([
            "backoffice-admin",
            "dashboard",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-31",
        ])
        .unwrap();
        match cli.command {
            Commands::Dashboard { period, from, to } => {
                assert!(period.is_none());
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2024, 3, 31));
            }
            _ => panic!("expected dashboard"),
        }

        let missing_end = Cli::try_parse_from(["backoffice-admin", "dashboard", "--from", "2024-03-01"]);
        assert!(missing_end.is_err());
    }

    #[test]
    fn test_named_period_rejects_dates() {
        let month = DateFilter::Month;
        assert_eq!(resolve_period(None, false, month).unwrap(), DateFilter::Month);
        assert_eq!(resolve_period(None, true, month).unwrap(), DateFilter::Custom);
        assert_eq!(
            resolve_period(Some(DateFilter::Custom), true, month).unwrap(),
            DateFilter::Custom
        );
        assert_eq!(
            resolve_period(Some(DateFilter::Week), false, month).unwrap(),
            DateFilter::Week
        );
        assert!(resolve_period(Some(DateFilter::Week), true, month).is_err());
    }

    #[test]
    fn test_org_create_arguments() {
        let cli = Cli::try_parse_from([
            "backoffice-admin",
            "--json",
            "orgs",
            "create",
            "--name",
            "NewCo",
            "--seats",
            "4",
            "--plan",
            "pro",
            "--subscription",
            "yearly",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Orgs {
                action:
                    OrgAction::Create {
                        plan,
                        subscription,
                        seats,
                        status,
                        ..
                    },
            } => {
                assert_eq!(plan, Plan::Pro);
                assert_eq!(subscription, Some(SubscriptionType::Yearly));
                assert_eq!(seats, 4);
                assert_eq!(status, OrganizationStatus::Active);
            }
            _ => panic!("expected orgs create"),
        }
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(LogFilter::All.status(), None);
        assert_eq!(LogFilter::Failed.status(), Some(LoginStatus::Failed));
    }
}

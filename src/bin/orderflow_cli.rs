use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use orderflow::{
    auth::{
        ensure_access, visible_pages, CredentialProvider, FileSessionStore, MemorySessionStore,
        Page, SessionStore,
    },
    client::ApiClient,
    config::{self, AppConfig},
    errors::ClientError,
    models::{
        Credentials, DashboardStats, DateFilter, NewOrder, NewUser, Order, OrderId, OrderStatus,
        OrderUpdate, Participant, PrestaOrder, Role, Stage, TransitionPayload, User, UserId,
        UserUpdate,
        presta::{EMPTY_FEED_MESSAGE, NOT_HANDLED_LABEL, UNTRACKED_ORDER_MESSAGE},
    },
    reports::{OrderDurations, ScoreEntry},
    services::{
        AuthService, DashboardService, OrderService, OrderStatistics, PrestaService, UserService,
    },
    views::{
        order_columns, spawn_poller, watch, BoardSnapshot, PollerHandle, StageBoard, TableView,
        TransitionOutcome,
    },
};
use serde::Serialize;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize()?;

    match cli.command {
        Commands::Auth(command) => handle_auth_command(&context, command, cli.json).await?,
        Commands::Orders(command) => handle_orders_command(&context, command, cli.json).await?,
        Commands::Users(command) => handle_users_command(&context, command, cli.json).await?,
        Commands::Dashboard(args) => handle_dashboard(&context, args, cli.json).await?,
        Commands::Stats(args) => handle_statistics(&context, args, cli.json).await?,
        Commands::Scoreboard => handle_scoreboard(&context, cli.json).await?,
        Commands::Presta => handle_presta(&context, cli.json).await?,
        Commands::Watch(args) => handle_watch(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "orderflow", about = "Warehouse order workflow client", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Auth(AuthCommands),
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Users(UsersCommands),
    /// Backend-aggregated counts, average times and agent figures
    Dashboard(DateArgs),
    /// Statistics derived locally from the order list
    Stats(DateArgs),
    /// Today's ranking of agents and managers
    Scoreboard,
    /// Today's web shop orders and who handled them
    Presta,
    /// Reload a stage queue, the scoreboard or the shop orders until interrupted
    Watch(WatchArgs),
}

#[derive(Subcommand)]
enum AuthCommands {
    Login(AuthLoginArgs),
    Refresh,
    Whoami,
    Logout,
}

#[derive(Args)]
struct AuthLoginArgs {
    #[arg(long, help = "Account username")]
    username: String,
    #[arg(long, help = "Account password")]
    password: String,
}

#[derive(Subcommand)]
enum OrdersCommands {
    /// Orders waiting for one stage
    Stage(StageListArgs),
    /// Every order, in the administration table
    List(ListOrdersArgs),
    Show(ShowOrderArgs),
    Create(CreateOrderArgs),
    Update(UpdateOrderArgs),
    Delete(DeleteOrdersArgs),
    /// Validate one order at a stage
    Advance(AdvanceOrderArgs),
}

#[derive(Subcommand)]
enum UsersCommands {
    List(ListUsersArgs),
    Show(UserIdArgs),
    Create(CreateUserArgs),
    Update(UpdateUserArgs),
    Delete(UserIdArgs),
    Role(ChangeRoleArgs),
    ResetPassword(ResetPasswordArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Preparation,
    Control,
    Packing,
}

impl From<StageArg> for Stage {
    fn from(value: StageArg) -> Self {
        match value {
            StageArg::Preparation => Stage::Preparation,
            StageArg::Control => Stage::Control,
            StageArg::Packing => Stage::Packing,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WatchTarget {
    Preparation,
    Control,
    Packing,
    Scoreboard,
    Presta,
}

impl WatchTarget {
    fn stage(self) -> Option<Stage> {
        match self {
            WatchTarget::Preparation => Some(Stage::Preparation),
            WatchTarget::Control => Some(Stage::Control),
            WatchTarget::Packing => Some(Stage::Packing),
            WatchTarget::Scoreboard | WatchTarget::Presta => None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Agent,
    SuperAgent,
    Manager,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Agent => Role::Agent,
            RoleArg::SuperAgent => Role::SuperAgent,
            RoleArg::Manager => Role::Manager,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderStatusArg {
    Created,
    Prepared,
    Controlled,
    Packed,
    Completed,
}

impl From<OrderStatusArg> for OrderStatus {
    fn from(value: OrderStatusArg) -> Self {
        match value {
            OrderStatusArg::Created => OrderStatus::Created,
            OrderStatusArg::Prepared => OrderStatus::Prepared,
            OrderStatusArg::Controlled => OrderStatus::Controlled,
            OrderStatusArg::Packed => OrderStatus::Packed,
            OrderStatusArg::Completed => OrderStatus::Completed,
        }
    }
}

#[derive(Args)]
struct DateArgs {
    #[arg(long, value_parser = parse_date, help = "Single day (YYYY-MM-DD)")]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date, requires = "to", conflicts_with = "date", help = "Range start (YYYY-MM-DD)")]
    from: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date, requires = "from", conflicts_with = "date", help = "Range end (YYYY-MM-DD)")]
    to: Option<NaiveDate>,
}

impl DateArgs {
    /// `None` when no flag was given, so lists stay unscoped.
    fn filter(&self) -> Option<DateFilter> {
        match (self.date, self.from, self.to) {
            (Some(day), _, _) => Some(DateFilter::Day(day)),
            (None, Some(start), Some(end)) => Some(DateFilter::Range { start, end }),
            _ => None,
        }
    }

    /// Dashboard pages default to today.
    fn filter_or_today(&self) -> DateFilter {
        self.filter().unwrap_or_default()
    }
}

#[derive(Args)]
struct TableArgs {
    #[arg(long, help = "Filter rows by text")]
    filter: Option<String>,
    #[arg(long, default_value_t = 1, value_parser = parse_positive_usize, help = "Page number, starting at 1")]
    page: usize,
    #[arg(long, value_parser = parse_positive_usize, help = "Rows per page (must be one of the configured sizes)")]
    page_size: Option<usize>,
    #[arg(long, help = "Column key to sort by")]
    sort: Option<String>,
    #[arg(long, action = ArgAction::SetTrue, requires = "sort", help = "Sort descending")]
    desc: bool,
}

#[derive(Args)]
struct StageListArgs {
    #[arg(value_enum)]
    stage: StageArg,
    #[arg(long, action = ArgAction::SetTrue, help = "Only orders created by the current user (preparation)")]
    creator_only: bool,
    #[command(flatten)]
    dates: DateArgs,
    #[command(flatten)]
    table: TableArgs,
}

#[derive(Args)]
struct ListOrdersArgs {
    #[arg(long, value_enum, help = "Only orders in this status")]
    status: Option<OrderStatusArg>,
    #[command(flatten)]
    dates: DateArgs,
    #[command(flatten)]
    table: TableArgs,
}

#[derive(Args)]
struct ShowOrderArgs {
    #[arg(long, conflicts_with = "reference", required_unless_present = "reference")]
    id: Option<OrderId>,
    #[arg(long, help = "Exact order reference")]
    reference: Option<String>,
}

#[derive(Args)]
struct CreateOrderArgs {
    #[arg(long)]
    reference: String,
    #[arg(long = "cart")]
    cart_number: String,
    #[arg(long, value_parser = parse_positive_u32)]
    line_count: Option<u32>,
}

#[derive(Args)]
struct UpdateOrderArgs {
    #[arg(long)]
    id: OrderId,
    #[arg(long = "cart")]
    cart_number: Option<String>,
    #[arg(long, value_enum)]
    status: Option<OrderStatusArg>,
    #[arg(long, value_parser = parse_positive_u32)]
    line_count: Option<u32>,
}

#[derive(Args)]
struct DeleteOrdersArgs {
    #[arg(long = "id", required = true, num_args = 1.., help = "Order ids to delete")]
    ids: Vec<OrderId>,
}

#[derive(Args)]
struct AdvanceOrderArgs {
    #[arg(value_enum)]
    stage: StageArg,
    #[arg(long)]
    id: OrderId,
    #[arg(long, value_parser = parse_positive_u32, help = "Corrected line count (preparation only)")]
    line_count: Option<u32>,
}

#[derive(Args)]
struct ListUsersArgs {
    #[arg(long, value_enum)]
    role: Option<RoleArg>,
}

#[derive(Args)]
struct UserIdArgs {
    #[arg(long)]
    id: UserId,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, value_enum, default_value = "agent")]
    role: RoleArg,
}

#[derive(Args)]
struct UpdateUserArgs {
    #[arg(long)]
    id: UserId,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
}

#[derive(Args)]
struct ChangeRoleArgs {
    #[arg(long)]
    id: UserId,
    #[arg(long, value_enum)]
    role: RoleArg,
}

#[derive(Args)]
struct ResetPasswordArgs {
    #[arg(long)]
    id: UserId,
    #[arg(long)]
    password: String,
}

#[derive(Args)]
struct WatchArgs {
    #[arg(value_enum)]
    target: WatchTarget,
    #[arg(long, value_parser = parse_positive_u64, help = "Seconds between reloads; defaults to the configured interval")]
    interval: Option<u64>,
    #[arg(long, help = "Filter a stage queue by order reference")]
    filter: Option<String>,
}

const PARTICIPANT_LABELS: [(&str, Participant); 4] = [
    ("créée", Participant::Creator),
    ("préparée", Participant::Preparer),
    ("contrôlée", Participant::Controller),
    ("emballée", Participant::Packer),
];

#[derive(Serialize)]
struct AuthLoginOutput {
    user: Option<User>,
    has_refresh_token: bool,
    pages: Vec<Page>,
    saved_session_path: Option<String>,
}

#[derive(Serialize)]
struct OrderDetailsOutput<'a> {
    order: &'a Order,
    durations: OrderDurations,
}

#[derive(Serialize)]
struct TablePageOutput<'a> {
    page: usize,
    page_count: usize,
    page_size: usize,
    matching: usize,
    rows: Vec<&'a Order>,
}

struct CliContext {
    config: AppConfig,
    api: Arc<ApiClient>,
}

impl CliContext {
    fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load client configuration")?;
        config::init_tracing(config.log_level(), config.log_json);

        let store: Arc<dyn SessionStore> = match config.session_file() {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => {
                warn!("No session path available; the session will not outlive this run");
                Arc::new(MemorySessionStore::new())
            }
        };
        let credentials =
            Arc::new(CredentialProvider::load(store).context("failed to read the saved session")?);
        let api = Arc::new(
            ApiClient::from_config(&config, credentials).context("failed to build the API client")?,
        );

        Ok(Self { config, api })
    }

    fn auth_service(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    fn order_service(&self) -> Arc<OrderService> {
        Arc::new(OrderService::new(self.api.clone()))
    }

    fn user_service(&self) -> UserService {
        UserService::new(self.api.clone())
    }

    fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.api.clone())
    }

    fn presta_service(&self) -> PrestaService {
        PrestaService::new(self.api.clone())
    }

    /// Local role gate; nothing is sent when it fails.
    fn require(&self, page: Page) -> Result<Role> {
        let role = self
            .auth_service()
            .current_role()
            .context("not logged in; run `orderflow auth login` first")?;
        ensure_access(role, page)?;
        debug!(%page, role = role.label(), "Access granted");
        Ok(role)
    }

    fn stage_board(&self, stage: Stage) -> Result<StageBoard> {
        StageBoard::from_config(stage, self.order_service(), &self.config)
            .context("invalid table configuration")
    }
}

async fn handle_auth_command(context: &CliContext, command: AuthCommands, json: bool) -> Result<()> {
    let service = context.auth_service();
    match command {
        AuthCommands::Login(args) => {
            let credentials = Credentials {
                username: normalize_string(args.username),
                password: args.password,
            };
            let session = service.login(credentials).await.context("login failed")?;
            let pages = session
                .user
                .as_ref()
                .map(|user| visible_pages(user.role))
                .unwrap_or_default();
            let saved_session_path = context
                .config
                .session_file()
                .map(|path| path.display().to_string());

            if json {
                print_json(&AuthLoginOutput {
                    user: session.user.clone(),
                    has_refresh_token: session.refresh_token.is_some(),
                    pages,
                    saved_session_path,
                })?;
            } else {
                match &session.user {
                    Some(user) => println!(
                        "Connecté en tant que {} ({})",
                        user.display_name(),
                        user.role.label()
                    ),
                    None => println!("Connecté"),
                }
                if !pages.is_empty() {
                    let titles: Vec<&str> = pages.iter().map(|page| page.title()).collect();
                    println!("Pages: {}", titles.join(", "));
                }
                if let Some(path) = saved_session_path {
                    println!("Session saved to: {path}");
                }
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            let session = service
                .refresh()
                .await
                .context("failed to refresh the access token")?;
            if json {
                print_json(&serde_json::json!({
                    "refreshed_at": session.saved_at,
                    "has_refresh_token": session.refresh_token.is_some(),
                }))?;
            } else {
                println!("Access token renewed at {}", session.saved_at);
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let user = service.whoami().context("not logged in")?;
            if json {
                print_json(&user)?;
            } else {
                render_user(&user);
                let titles: Vec<&str> = visible_pages(user.role).iter().map(|p| p.title()).collect();
                println!("  pages: {}", titles.join(", "));
            }
            Ok(())
        }
        AuthCommands::Logout => {
            service.logout();
            if json {
                print_json(&serde_json::json!({ "status": "logged_out" }))?;
            } else {
                println!("Déconnecté");
            }
            Ok(())
        }
    }
}

async fn handle_orders_command(
    context: &CliContext,
    command: OrdersCommands,
    json: bool,
) -> Result<()> {
    match command {
        OrdersCommands::Stage(args) => {
            let stage = Stage::from(args.stage);
            context.require(Page::for_stage(stage))?;
            let board = context
                .stage_board(stage)?
                .with_creator_only(args.creator_only)
                .with_date(args.dates.filter());
            board
                .reload()
                .await
                .with_context(|| format!("failed to load the {stage} queue"))?;
            if let Some(query) = normalize_optional_string(args.table.filter.clone()) {
                board.set_query(query);
            }
            board.with_table(|table| apply_table_args(table, &args.table, false))?;

            let snapshot = board.snapshot();
            if json {
                print_json(&snapshot)?;
            } else {
                render_board(&snapshot);
            }
            Ok(())
        }
        OrdersCommands::List(args) => {
            context.require(Page::Orders)?;
            let mut orders = context
                .order_service()
                .list_orders(args.dates.filter())
                .await
                .context("failed to list orders")?;
            if let Some(status) = args.status.map(OrderStatus::from) {
                orders.retain(|order| order.status == status);
            }

            let mut table = TableView::from_config(order_columns(), &context.config)?;
            table.set_rows(orders);
            apply_table_args(&mut table, &args.table, true)?;

            if json {
                print_json(&TablePageOutput {
                    page: table.page() + 1,
                    page_count: table.page_count(),
                    page_size: table.page_size(),
                    matching: table.filtered_count(),
                    rows: table.visible(),
                })?;
            } else {
                println!(
                    "Commandes page {}/{} ({} par page) total {}",
                    table.page() + 1,
                    table.page_count(),
                    table.page_size(),
                    table.filtered_count()
                );
                for order in table.visible() {
                    render_order(order);
                }
            }
            Ok(())
        }
        OrdersCommands::Show(args) => {
            context.require(Page::Dashboard)?;
            let service = context.order_service();
            let order = match (args.id, args.reference) {
                (Some(id), _) => service
                    .get_order(id)
                    .await
                    .with_context(|| format!("failed to fetch order {id}"))?,
                (None, Some(reference)) => service
                    .find_by_reference(&reference)
                    .await
                    .with_context(|| format!("no order found for reference '{}'", reference.trim()))?,
                (None, None) => bail!("either --id or --reference is required"),
            };
            let durations = OrderDurations::of(&order);

            if json {
                print_json(&OrderDetailsOutput {
                    order: &order,
                    durations,
                })?;
            } else {
                render_order_details(&order, &durations);
            }
            Ok(())
        }
        OrdersCommands::Create(args) => {
            context.require(Page::Preparation)?;
            let mut order = NewOrder::new(normalize_string(args.reference), normalize_string(args.cart_number));
            order.line_count = args.line_count;
            let created = context
                .order_service()
                .create_order(order)
                .await
                .context("failed to create order")?;
            if json {
                print_json(&created)?;
            } else {
                println!("Commande {} créée (id {})", created.reference, created.id);
                render_order(&created);
            }
            Ok(())
        }
        OrdersCommands::Update(args) => {
            context.require(Page::Orders)?;
            let changes = OrderUpdate {
                cart_number: normalize_optional_string(args.cart_number),
                status: args.status.map(OrderStatus::from),
                line_count: args.line_count,
            };
            let updated = context
                .order_service()
                .update_order(args.id, changes)
                .await
                .with_context(|| format!("failed to update order {}", args.id))?;
            if json {
                print_json(&updated)?;
            } else {
                println!("Commande {} mise à jour", updated.id);
                render_order(&updated);
            }
            Ok(())
        }
        OrdersCommands::Delete(args) => {
            context.require(Page::Orders)?;
            let result = context
                .order_service()
                .delete_orders(args.ids)
                .await
                .context("failed to delete orders")?;
            if json {
                print_json(&result)?;
            } else if result.message.is_empty() {
                println!("{} commande(s) supprimée(s)", result.deleted_count);
            } else {
                println!("{}", result.message);
            }
            Ok(())
        }
        OrdersCommands::Advance(args) => {
            let stage = Stage::from(args.stage);
            context.require(Page::for_stage(stage))?;
            let board = context.stage_board(stage)?;
            let payload = TransitionPayload {
                line_count: args.line_count,
            };

            match board.transition(args.id, payload).await {
                TransitionOutcome::Completed(order) => {
                    let snapshot = board.snapshot();
                    if json {
                        print_json(&serde_json::json!({
                            "order": order,
                            "remaining": snapshot.loaded,
                        }))?;
                    } else {
                        println!(
                            "Commande {} validée: {}",
                            order.reference,
                            order.status.label()
                        );
                        println!("{} commande(s) restante(s) en {}", snapshot.loaded, snapshot.label);
                    }
                    Ok(())
                }
                TransitionOutcome::Failed {
                    message,
                    session_expired,
                } => {
                    if session_expired {
                        bail!("{message} (run `orderflow auth login`)");
                    }
                    bail!("{message}");
                }
            }
        }
    }
}

async fn handle_users_command(context: &CliContext, command: UsersCommands, json: bool) -> Result<()> {
    context.require(Page::Users)?;
    let service = context.user_service();
    match command {
        UsersCommands::List(args) => {
            let users = service
                .list_users(args.role.map(Role::from))
                .await
                .context("failed to list users")?;
            if json {
                print_json(&users)?;
            } else {
                println!("Utilisateurs ({})", users.len());
                for user in &users {
                    render_user(user);
                }
            }
            Ok(())
        }
        UsersCommands::Show(args) => {
            let user = service
                .get_user(args.id)
                .await
                .with_context(|| format!("failed to fetch user {}", args.id))?;
            print_user(&user, json)
        }
        UsersCommands::Create(args) => {
            let user = NewUser {
                username: normalize_string(args.username),
                email: normalize_string(args.email),
                password: args.password,
                first_name: normalize_string(args.first_name),
                last_name: normalize_string(args.last_name),
                role: args.role.into(),
            };
            let created = service.create_user(user).await.context("failed to create user")?;
            print_user(&created, json)
        }
        UsersCommands::Update(args) => {
            let changes = UserUpdate {
                username: normalize_optional_string(args.username),
                email: normalize_optional_string(args.email),
                first_name: normalize_optional_string(args.first_name),
                last_name: normalize_optional_string(args.last_name),
                role: None,
            };
            let updated = service
                .update_user(args.id, changes)
                .await
                .with_context(|| format!("failed to update user {}", args.id))?;
            print_user(&updated, json)
        }
        UsersCommands::Delete(args) => {
            service
                .delete_user(args.id)
                .await
                .with_context(|| format!("failed to delete user {}", args.id))?;
            if json {
                print_json(&serde_json::json!({ "user_id": args.id, "status": "deleted" }))?;
            } else {
                println!("Utilisateur {} supprimé", args.id);
            }
            Ok(())
        }
        UsersCommands::Role(args) => {
            let updated = service
                .change_role(args.id, args.role.into())
                .await
                .with_context(|| format!("failed to change role of user {}", args.id))?;
            print_user(&updated, json)
        }
        UsersCommands::ResetPassword(args) => {
            service
                .reset_password(args.id, args.password)
                .await
                .with_context(|| format!("failed to reset password of user {}", args.id))?;
            if json {
                print_json(&serde_json::json!({ "user_id": args.id, "status": "password_reset" }))?;
            } else {
                println!("Mot de passe de l'utilisateur {} réinitialisé", args.id);
            }
            Ok(())
        }
    }
}

async fn handle_dashboard(context: &CliContext, args: DateArgs, json: bool) -> Result<()> {
    context.require(Page::Dashboard)?;
    let stats = context
        .dashboard_service()
        .dashboard(args.filter_or_today())
        .await
        .context("failed to load the dashboard")?;
    if json {
        print_json(&stats)?;
    } else {
        render_dashboard(&stats);
    }
    Ok(())
}

async fn handle_statistics(context: &CliContext, args: DateArgs, json: bool) -> Result<()> {
    context.require(Page::Statistics)?;
    let stats = context
        .dashboard_service()
        .statistics(args.filter_or_today())
        .await
        .context("failed to compute statistics")?;
    if json {
        print_json(&stats)?;
    } else {
        render_statistics(&stats);
    }
    Ok(())
}

async fn handle_scoreboard(context: &CliContext, json: bool) -> Result<()> {
    context.require(Page::Scoreboard)?;
    let entries = context
        .dashboard_service()
        .scoreboard()
        .await
        .context("failed to load the scoreboard")?;
    if json {
        print_json(&entries)?;
    } else {
        render_scoreboard(&entries);
    }
    Ok(())
}

async fn handle_presta(context: &CliContext, json: bool) -> Result<()> {
    context.require(Page::PrestaOrders)?;
    let orders = context
        .presta_service()
        .todays_orders()
        .await
        .context("failed to load the shop orders")?;
    if json {
        print_json(&orders)?;
    } else {
        render_presta_orders(&orders);
    }
    Ok(())
}

async fn handle_watch(context: &CliContext, args: WatchArgs, json: bool) -> Result<()> {
    let interval = args.interval.map(Duration::from_secs);
    let poller = match (args.target, args.target.stage()) {
        (_, Some(stage)) => watch_stage(context, stage, args.filter, interval, json)?,
        (WatchTarget::Presta, None) => {
            context.require(Page::PrestaOrders)?;
            let service = context.presta_service();
            watch(
                interval.unwrap_or_else(|| context.config.presta_poll_interval()),
                move || {
                    let service = service.clone();
                    async move { service.todays_orders().await }
                },
                move |result| publish_update(result, json, |orders: &Vec<PrestaOrder>| {
                    render_presta_orders(orders)
                }),
            )
        }
        (_, None) => {
            context.require(Page::Scoreboard)?;
            let service = context.dashboard_service();
            watch(
                interval.unwrap_or_else(|| context.config.poll_interval()),
                move || {
                    let service = service.clone();
                    async move { service.scoreboard().await }
                },
                move |result| publish_update(result, json, |entries: &Vec<ScoreEntry>| {
                    render_scoreboard(entries)
                }),
            )
        }
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for interrupt")?;
    poller.stop();
    Ok(())
}

fn watch_stage(
    context: &CliContext,
    stage: Stage,
    filter: Option<String>,
    interval: Option<Duration>,
    json: bool,
) -> Result<PollerHandle> {
    context.require(Page::for_stage(stage))?;
    let board = Arc::new(context.stage_board(stage)?);
    if let Some(query) = normalize_optional_string(filter) {
        board.set_query(query);
    }
    let period = interval.unwrap_or_else(|| context.config.poll_interval());

    Ok(spawn_poller(period, move || {
        let board = board.clone();
        async move {
            match board.reload().await {
                Ok(_) => publish_update(Ok(board.snapshot()), json, render_board),
                Err(err) if err.is_superseded() => {}
                Err(err) => publish_update::<BoardSnapshot, _>(Err(err), json, render_board),
            }
        }
    }))
}

/// Prints one refresh of a watched page; failures go to stderr and the watch goes on.
fn publish_update<T, R>(result: Result<T, ClientError>, json: bool, render: R)
where
    T: Serialize,
    R: Fn(&T),
{
    match result {
        Ok(value) if json => {
            if let Err(err) = print_json(&value) {
                warn!(error = %err, "Failed to render update");
            }
        }
        Ok(value) => render(&value),
        Err(err) => eprintln!("{}", err.user_message()),
    }
}

fn apply_table_args(table: &mut TableView<Order>, args: &TableArgs, search: bool) -> Result<()> {
    if search {
        if let Some(query) = normalize_optional_string(args.filter.clone()) {
            table.set_search(query);
        }
    }
    if let Some(size) = args.page_size {
        table.set_page_size(size)?;
    }
    if let Some(column) = args.sort.as_deref() {
        table.toggle_sort(column)?;
        if args.desc {
            table.toggle_sort(column)?;
        }
    }
    let page = args.page.saturating_sub(1);
    if page >= table.page_count() {
        return Err(anyhow!(
            "page {} does not exist ({} page(s))",
            args.page,
            table.page_count()
        ));
    }
    table.set_page(page);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_user(user: &User, json: bool) -> Result<()> {
    if json {
        print_json(user)
    } else {
        render_user(user);
        Ok(())
    }
}

fn render_order(order: &Order) {
    let lines = order
        .line_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "- #{} • {} • chariot {} • {} lignes • {}",
        order.id,
        order.reference,
        order.cart().unwrap_or("-"),
        lines,
        order.status.label()
    );
}

fn render_order_details(order: &Order, durations: &OrderDurations) {
    render_order(order);
    for (label, role) in PARTICIPANT_LABELS {
        let stamp = order
            .stamp_for(role)
            .map(|ts| ts.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());
        let person = order
            .participant_name(role)
            .unwrap_or_else(|| "-".to_string());
        println!("  {label:<10} {stamp} par {person}");
    }
    println!("  Durée de préparation: {}", durations.preparation);
    println!("  Durée de contrôle:    {}", durations.control);
    println!("  Durée d'emballage:    {}", durations.packing);
    println!("  Durée totale:         {}", durations.total);
}

fn render_board(snapshot: &BoardSnapshot) {
    println!(
        "{} [{}] page {}/{} • {} sur {} commande(s)",
        snapshot.label,
        snapshot.color,
        snapshot.page + 1,
        snapshot.page_count,
        snapshot.matching,
        snapshot.loaded
    );
    if let Some(alert) = &snapshot.alert {
        println!("! {alert}");
    }
    if let Some(notice) = &snapshot.notice {
        println!("{notice}");
    }
    for order in &snapshot.rows {
        render_order(order);
    }
}

fn render_user(user: &User) {
    println!(
        "- Utilisateur {} • {} • {} • {}",
        user.id,
        user.display_name(),
        user.email,
        user.role.label()
    );
}

fn render_dashboard(stats: &DashboardStats) {
    let counts = &stats.order_counts;
    println!(
        "Commandes: {} total • {} en cours • {} terminées",
        counts.total, counts.in_progress, counts.completed
    );
    let times = &stats.average_times;
    println!(
        "Temps moyens: préparation {:.1} min • contrôle {:.1} min • emballage {:.1} min • total {:.1} min",
        times.preparation, times.control, times.packing, times.total
    );
    for agent in &stats.agent_stats {
        println!(
            "- {} • créées {} • préparées {} • contrôlées {} • emballées {}",
            agent.display_name(),
            agent.created_count,
            agent.prepared_count,
            agent.controlled_count,
            agent.packed_count
        );
    }
}

fn render_statistics(stats: &OrderStatistics) {
    let (start, end) = stats.window;
    println!("Période du {start} au {end}");
    println!(
        "Commandes: {} total • {} en cours • {} terminées",
        stats.counts.total, stats.counts.in_progress, stats.counts.completed
    );
    let format_avg = |value: Option<f64>| {
        value
            .map(|minutes| format!("{minutes:.1} min"))
            .unwrap_or_else(|| orderflow::reports::UNAVAILABLE_LABEL.to_string())
    };
    println!(
        "Temps moyens: préparation {} • contrôle {} • emballage {} • total {}",
        format_avg(stats.averages.preparation),
        format_avg(stats.averages.control),
        format_avg(stats.averages.packing),
        format_avg(stats.averages.total)
    );
    println!("Par jour:");
    for day in &stats.daily {
        println!("  {} • {}", day.day, day.total);
    }
    println!("Par agent:");
    for agent in &stats.agents {
        println!(
            "  {} • créées {} • préparées {} • contrôlées {} • emballées {}",
            agent.name, agent.created, agent.prepared, agent.controlled, agent.packed
        );
    }
    println!("Dernières commandes:");
    for recent in &stats.recent {
        println!(
            "  {} • {} • {}",
            recent.reference,
            recent.status.label(),
            recent.agent
        );
    }
}

fn render_presta_orders(orders: &[PrestaOrder]) {
    println!("Commandes PrestaShop du jour ({})", orders.len());
    if orders.is_empty() {
        println!("{EMPTY_FEED_MESSAGE}");
        return;
    }
    for order in orders {
        let date = order
            .date
            .as_ref()
            .map(|ts| ts.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {} • {} • {} • {} [{}] • {} • {}",
            order.reference,
            date,
            order.customer_name,
            order.status_label(),
            order.status_color(),
            order.total_display(),
            order.payment_method
        );
        for product in &order.products {
            println!(
                "    {} × {} à {}",
                product.quantity,
                product.product_name,
                product.price_display()
            );
        }
        if !order.is_tracked() {
            println!("    {UNTRACKED_ORDER_MESSAGE}");
            continue;
        }
        for (label, role) in PARTICIPANT_LABELS {
            let record = order.handler(role);
            let who = record
                .and_then(|handler| handler.user.as_ref())
                .map(|user| format!("{} ({})", user.display_name(), user.role))
                .unwrap_or_else(|| NOT_HANDLED_LABEL.to_string());
            let when = record
                .and_then(|handler| handler.timestamp.as_ref())
                .map(|ts| format!(" le {ts}"))
                .unwrap_or_default();
            println!("    {label:<10} par {who}{when}");
        }
    }
}

fn render_scoreboard(entries: &[ScoreEntry]) {
    if entries.is_empty() {
        println!("Aucune activité aujourd'hui");
        return;
    }
    for entry in entries {
        println!(
            "{:>2}. {} • préparées {} • contrôlées {} • emballées {} • total {}",
            entry.rank, entry.name, entry.prepared, entry.controlled, entry.packed, entry.total
        );
    }
}

fn normalize_string(value: String) -> String {
    value.trim().to_string()
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn parse_positive_u64(raw: &str) -> Result<u64, String> {
    let value: u64 = raw
        .parse()
        .map_err(|_| format!("invalid integer '{raw}'"))?;
    if value == 0 {
        Err("value must be greater than zero".to_string())
    } else {
        Ok(value)
    }
}

fn parse_positive_u32(raw: &str) -> Result<u32, String> {
    let value = parse_positive_u64(raw)?;
    u32::try_from(value).map_err(|_| format!("value '{raw}' is too large"))
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let value = parse_positive_u64(raw)?;
    usize::try_from(value).map_err(|_| format!("value '{raw}' is too large"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

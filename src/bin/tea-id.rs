use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;

use tea_id::access::{self, PatientForm, PatientView, SessionDraft};
use tea_id::config::{ClientConfig, ConfigError};
use tea_id::guard::{self, Route};
use tea_id::identity::{FirebaseIdentity, IdentityError};
use tea_id::net::api::{ApiError, BackendClient};
use tea_id::net::bridge::{BridgeClient, BridgeError, SessionExchange};
use tea_id::net::types::{Patient, ProfileType, TherapyType, User};
use tea_id::store::{AuthError, AuthSnapshot, AuthStore, Registration};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),
    #[error("backend error: {0}")]
    Api(#[from] ApiError),
    #[error("session bridge error: {0}")]
    Bridge(#[from] BridgeError),
    #[error("{0}")]
    Auth(String),
    #[error("access denied: {0}")]
    Access(#[from] access::AccessError),
    #[error("patient {0} is not visible to this user")]
    PatientHidden(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "tea-id", about = "TEA ID auth and patient CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct Credentials {
    #[arg(long, env = "TEA_ID_EMAIL")]
    email: String,
    #[arg(long, env = "TEA_ID_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in, open a bridge session, and show where the user lands.
    ///
    /// Every command that signs in logs out again before exiting.
    Login {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long, default_value = "/dashboard")]
        route: String,
    },
    /// Create an identity account and its backend profile.
    Register(RegisterArgs),
    /// Resolve the auth state and the guard decision for a route.
    ///
    /// Without credentials this reports the anonymous state.
    Status {
        #[arg(long, env = "TEA_ID_EMAIL", requires = "password")]
        email: Option<String>,
        #[arg(long, env = "TEA_ID_PASSWORD", hide_env_values = true, requires = "email")]
        password: Option<String>,
        #[arg(long, default_value = "/dashboard")]
        route: String,
    },
    /// List the patients visible on the user's dashboard.
    Patients {
        #[command(flatten)]
        credentials: Credentials,
        /// Extra patient ids to check, for roles without a patient listing.
        #[arg(long = "patient-id")]
        patient_ids: Vec<String>,
    },
    /// Add a patient as a guardian or organization.
    AddPatient(AddPatientArgs),
    /// Log a therapy session as an assigned professional.
    LogSession(LogSessionArgs),
}

#[derive(Args, Debug)]
struct AddPatientArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    name: String,
    #[arg(long)]
    cpf: String,
    #[arg(long)]
    birth_date: String,
    #[arg(long)]
    diagnosis: String,
    /// Required for organizations.
    #[arg(long)]
    guardian_id: Option<String>,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    document_id: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "TEA_ID_PASSWORD", hide_env_values = true)]
    password: String,
    /// Defaults to `--password`.
    #[arg(long)]
    password_confirmation: Option<String>,
    #[arg(long)]
    profile_type: ProfileType,
}

#[derive(Args, Debug)]
struct LogSessionArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    patient_id: String,
    #[arg(long, default_value = "Fonoaudiologia")]
    therapy_type: TherapyType,
    #[arg(long, default_value = "")]
    notes: String,
    #[arg(long)]
    audio_url: Option<String>,
}

/// Concrete clients shared by every command.
struct Clients {
    store: AuthStore,
    backend: Arc<BackendClient>,
    bridge: Arc<BridgeClient>,
}

impl Clients {
    fn build(config: ClientConfig) -> Result<Self, CliError> {
        let identity = Arc::new(FirebaseIdentity::new(config.identity)?);
        let backend = Arc::new(BackendClient::new(&config.backend.base_url, identity.clone())?);
        let bridge = Arc::new(BridgeClient::new(&config.bridge_url)?);
        let store = AuthStore::spawn(identity, backend.clone(), bridge.clone(), config.locale);
        Ok(Self { store, backend, bridge })
    }

    async fn login(&self, credentials: &Credentials) -> Result<User, CliError> {
        self.store.wait_resolved().await;
        self.store
            .login(&credentials.email, &credentials.password)
            .await
            .map_err(|e| self.auth_error(&e))
    }

    fn auth_error(&self, err: &AuthError) -> CliError {
        CliError::Auth(err.message(self.store.locale()).to_owned())
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let clients = Clients::build(ClientConfig::from_env()?)?;

    let result = match cli.command {
        Command::Login { credentials, route } => run_login(&clients, &credentials, &route).await,
        Command::Register(args) => run_register(&clients, args).await,
        Command::Status { email, password, route } => {
            let credentials = email.zip(password).map(|(email, password)| Credentials { email, password });
            run_status(&clients, credentials.as_ref(), &route).await
        }
        Command::Patients { credentials, patient_ids } => run_patients(&clients, &credentials, patient_ids).await,
        Command::AddPatient(args) => run_add_patient(&clients, args).await,
        Command::LogSession(args) => run_log_session(&clients, args).await,
    };

    if clients.store.close().await {
        eprintln!("logged out");
    }
    result
}

async fn run_login(clients: &Clients, credentials: &Credentials, route: &str) -> Result<(), CliError> {
    let user = clients.login(credentials).await?;
    eprintln!("logged in as {} ({})", user.email, user.profile_type.as_str());
    print_snapshot(&clients.store.snapshot(), route);
    print_json(&clients.bridge.status().await?)
}

async fn run_register(clients: &Clients, args: RegisterArgs) -> Result<(), CliError> {
    clients.store.wait_resolved().await;
    let form = Registration {
        name: args.name,
        document_id: args.document_id,
        email: args.email,
        password_confirmation: args.password_confirmation.unwrap_or_else(|| args.password.clone()),
        password: args.password,
        profile_type: args.profile_type,
    };
    let user = clients.store.register(&form).await.map_err(|e| clients.auth_error(&e))?;
    eprintln!("registered; continue with `tea-id login`");
    print_json(&user)
}

async fn run_status(clients: &Clients, credentials: Option<&Credentials>, route: &str) -> Result<(), CliError> {
    let mut snapshot = clients.store.wait_resolved().await;
    if let Some(credentials) = credentials {
        clients.login(credentials).await?;
        snapshot = clients.store.snapshot();
    }
    print_snapshot(&snapshot, route);
    print_json(&clients.bridge.status().await?)
}

async fn run_patients(clients: &Clients, credentials: &Credentials, extra_ids: Vec<String>) -> Result<(), CliError> {
    let user = clients.login(credentials).await?;

    let mut candidates: Vec<Patient> = match user.profile_type {
        ProfileType::Guardian => clients.backend.patients_by_guardian(&user.id).await?,
        ProfileType::Professional | ProfileType::Organization => Vec::new(),
    };
    let listed = user.patient_ids.clone().unwrap_or_default();
    for id in listed.iter().chain(extra_ids.iter()) {
        if candidates.iter().any(|p| p.id == *id) {
            continue;
        }
        match clients.backend.patient(id).await {
            Ok(patient) => candidates.push(patient),
            Err(ApiError::NotFound) => eprintln!("patient {id} not found"),
            Err(e) => return Err(e.into()),
        }
    }

    print_json(&access::patients_for(&user, candidates))
}

async fn run_add_patient(clients: &Clients, args: AddPatientArgs) -> Result<(), CliError> {
    let user = clients.login(&args.credentials).await?;
    let form = PatientForm {
        name: args.name,
        cpf: args.cpf,
        birth_date: args.birth_date,
        diagnosis: args.diagnosis,
        guardian_id: args.guardian_id,
    };
    let created = clients.backend.create_patient(&access::new_patient(&user, form)?).await?;
    print_json(&created)
}

async fn run_log_session(clients: &Clients, args: LogSessionArgs) -> Result<(), CliError> {
    let user = clients.login(&args.credentials).await?;
    let patient = clients.backend.patient(&args.patient_id).await?;
    let sessions = clients.backend.sessions_by_patient(&patient.id).await?;

    let Some(mut view) = PatientView::build(&user, patient, sessions) else {
        return Err(CliError::PatientHidden(args.patient_id));
    };
    if !view.show_session_logger {
        return Err(access::AccessError::NotAssigned.into());
    }

    let draft = SessionDraft { notes: args.notes, therapy_type: args.therapy_type, audio_url: args.audio_url };
    let new_session = draft.into_new_session(&user, &view.patient, OffsetDateTime::now_utc())?;
    let created = clients.backend.create_session(&new_session).await?;
    view.record(created);
    print_json(&view.sessions)
}

fn print_snapshot(snapshot: &AuthSnapshot, route: &str) {
    let route = Route::parse(route);
    eprintln!("phase: {:?}", snapshot.phase());
    if let Some(error) = &snapshot.error {
        eprintln!("error: {error}");
    }
    eprintln!("{route} => {:?}", guard::resolve(snapshot, &route));
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

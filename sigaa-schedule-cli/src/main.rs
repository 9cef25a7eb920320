mod commands;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sigaa_schedule_core::store::ScheduleStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::store::FileStore;

const APP_NAME: &str = "sigaa-schedule";

#[derive(Parser)]
#[command(name = "sigaa-schedule")]
#[command(about = "Visualizador de horários exportados do SIGAA")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ativar logs detalhados
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Diretório onde os dados importados são salvos
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Importar a página de horários exportada do SIGAA (HTML)
    Import {
        /// Arquivo HTML exportado
        file: PathBuf,
    },

    /// Mostrar as aulas de um dia
    Daily {
        /// Dia da semana (segunda, terca, quarta, quinta, sexta, sabado); padrão: hoje
        #[arg(short, long)]
        day: Option<String>,
    },

    /// Mostrar a semana completa
    Weekly {
        /// Exibir em grade por horário
        #[arg(short, long)]
        grid: bool,
    },

    /// Mostrar os dados do aluno
    Identity,

    /// Gerar o JSON de cadastro do aluno
    RegisterPayload {
        /// User agent usado para identificar o dispositivo
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Apagar os dados salvos
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "sigaa_schedule_cli={},sigaa_schedule_core={}",
                    log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file_store = match cli.data_dir {
        Some(dir) => FileStore::new(dir)?,
        None => FileStore::with_default_dir(APP_NAME)?,
    };
    tracing::debug!("Data directory: {}", file_store.data_dir().display());
    let store = ScheduleStore::new(file_store);

    match cli.command {
        Commands::Import { file } => commands::import_command(&store, file).await,
        Commands::Daily { day } => commands::daily_command(&store, day).await,
        Commands::Weekly { grid } => commands::weekly_command(&store, grid).await,
        Commands::Identity => commands::identity_command(&store).await,
        Commands::RegisterPayload { user_agent } => {
            commands::register_payload_command(&store, user_agent).await
        }
        Commands::Clear => commands::clear_command(&store).await,
    }
}

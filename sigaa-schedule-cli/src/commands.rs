use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use sigaa_schedule_core::{charset, prelude::*};

use crate::store::FileStore;

pub type AppStore = ScheduleStore<FileStore>;

/// Importar a página exportada do SIGAA
pub async fn import_command(store: &AppStore, file: PathBuf) -> Result<()> {
    tracing::info!("Importando {}", file.display());

    let raw = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Falha ao ler {}", file.display()))?;
    let html = charset::decode_document(&raw);

    let parsed = ScheduleDocumentParser::default().parse(&html);
    for issue in &parsed.issues {
        if matches!(issue, sigaa_schedule_core::Error::RowExtraction { .. }) {
            tracing::debug!("{}", issue);
        } else {
            tracing::warn!("{}", issue);
        }
    }

    if !parsed.has_tables() {
        anyhow::bail!("O arquivo não contém tabelas. Exporte a página de horários do SIGAA.");
    }
    if parsed.is_empty() {
        anyhow::bail!(
            "Nenhuma disciplina encontrada nas {} tabelas do arquivo",
            parsed.tables_found
        );
    }

    store.save_schedules(&parsed.entries).await?;
    if let Some(identity) = &parsed.identity {
        store.save_identity(identity).await?;
    }
    store.set_file_loaded(true).await?;

    println!("✓ {} aulas importadas", parsed.entries.len());
    match &parsed.identity {
        Some(identity) => println!(
            "✓ Aluno: {} ({})",
            identity.full_name, identity.registration_id
        ),
        None => println!("! Tabela de identificação não encontrada"),
    }

    Ok(())
}

/// Aulas de um dia, por padrão o de hoje
pub async fn daily_command(store: &AppStore, day: Option<String>) -> Result<()> {
    let entries = load_entries(store).await?;

    let day = match day {
        Some(key) => DayOfWeek::from_key(&key)
            .ok_or_else(|| anyhow::anyhow!("Dia desconhecido: {}", key))?,
        None => match DayOfWeek::from_weekday(Local::now().weekday()) {
            Some(day) => day,
            None => {
                println!("Domingo: nenhuma aula");
                return Ok(());
            }
        },
    };

    let classes = classes_for_day(&entries, day);
    println!("{}", day.label());
    if classes.is_empty() {
        println!("  Nenhuma aula");
    }
    for class in classes {
        print_class(class);
    }

    Ok(())
}

/// Semana completa, em lista ou em grade
pub async fn weekly_command(store: &AppStore, grid: bool) -> Result<()> {
    let weekly = WeeklyTimetable::from_entries(load_entries(store).await?);

    if grid {
        print_grid(&weekly);
        return Ok(());
    }

    for (day, classes) in weekly.iter() {
        println!("{}", day.label());
        if classes.is_empty() {
            println!("  Nenhuma aula");
        }
        for class in classes {
            print_class(class);
        }
        println!();
    }

    Ok(())
}

/// Dados do aluno salvos na importação
pub async fn identity_command(store: &AppStore) -> Result<()> {
    let identity = store
        .load_identity()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Nenhum dado de aluno salvo. Use `import` primeiro."))?;

    println!("Nome:           {}", identity.full_name);
    println!("Matrícula:      {}", identity.registration_id);
    println!("Curso:          {}", identity.program);
    println!("Formação:       {}", identity.degree_level);
    println!("Período letivo: {}", identity.academic_term);

    Ok(())
}

/// Montar o JSON de cadastro sem enviá-lo
pub async fn register_payload_command(store: &AppStore, user_agent: Option<String>) -> Result<()> {
    let identity = store
        .load_identity()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Nenhum dado de aluno salvo. Use `import` primeiro."))?;

    let device = match user_agent {
        Some(ua) => DeviceInfo::from_user_agent(&ua),
        None => DeviceInfo::host(),
    };
    let kind = RegistrationKind::for_first_access(store.is_first_access().await?);
    tracing::info!("Payload de {:?} para {}", kind, device.device_name);

    let payload = RegistrationPayload::new(&identity, &device);
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

/// Apagar todos os dados salvos
pub async fn clear_command(store: &AppStore) -> Result<()> {
    store.clear_all().await?;
    println!("✓ Dados apagados de {}", store.inner().data_dir().display());
    Ok(())
}

async fn load_entries(store: &AppStore) -> Result<Vec<ScheduleEntry>> {
    store
        .load_schedules()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Nenhum horário salvo. Use `import` primeiro."))
}

fn print_class(class: &ScheduleEntry) {
    println!(
        "  {}-{}  {}",
        class.start_time.format("%H:%M"),
        class.end_time.format("%H:%M"),
        class.subject
    );
    if !class.location.is_empty() {
        println!("               Local: {}", class.location);
    }
    if !class.teacher.is_empty() {
        println!("               Docente: {}", class.teacher);
    }
}

const GRID_CELL: usize = 14;

fn print_grid(weekly: &WeeklyTimetable) {
    let mut header = format!("{:<15}", "");
    for day in DayOfWeek::ALL {
        header.push_str(&format!(" {:<width$}", day.key(), width = GRID_CELL));
    }
    println!("{}", header);

    for row in weekly.grid() {
        let mut line = format!(
            "{:<3} {}-{}",
            row.slot.label(),
            row.slot.start.format("%H:%M"),
            row.slot.end.format("%H:%M")
        );
        for cell in row.cells {
            let text = cell.map(|class| grid_text(&class.subject)).unwrap_or_default();
            line.push_str(&format!(" {:<width$}", text, width = GRID_CELL));
        }
        println!("{}", line.trim_end());
    }
}

fn grid_text(subject: &str) -> String {
    if subject.chars().count() <= GRID_CELL {
        subject.to_string()
    } else {
        let mut text: String = subject.chars().take(GRID_CELL - 1).collect();
        text.push('…');
        text
    }
}

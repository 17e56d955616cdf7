use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use medtrack_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "Medication tracking and adherence system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's schedule, generating dose records first (default)
    Today,

    /// Mark a dose as taken
    Take {
        /// Dose id, as printed by `today`
        dose_id: String,

        /// How well the medication worked, 1-5
        #[arg(long)]
        effectiveness: Option<u8>,

        /// Side effect experienced (repeatable)
        #[arg(long = "side-effect")]
        side_effects: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Push a dose's reminder into the future
    Snooze {
        dose_id: String,

        /// Minutes to snooze for (defaults from config)
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Add a medication to the current profile
    Add {
        name: String,

        #[arg(long)]
        dosage: String,

        /// pill, liquid, injection or topical
        #[arg(long, default_value = "pill")]
        kind: String,

        /// daily, weekly or as-needed
        #[arg(long, default_value = "daily")]
        frequency: String,

        /// Scheduled clock time, HH:MM (repeatable)
        #[arg(long = "time")]
        times: Vec<String>,

        #[arg(long, default_value_t = 30)]
        quantity: u32,

        #[arg(long, default_value = "")]
        doctor: String,

        #[arg(long, default_value = "")]
        pharmacy: String,

        /// Refill due date, YYYY-MM-DD
        #[arg(long)]
        refill_date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List the current profile's medications
    List {
        /// Search text (matches name, doctor, pharmacy, notes)
        #[arg(long)]
        query: Option<String>,

        /// all, active or inactive
        #[arg(long, default_value = "all")]
        status: String,

        /// name, time, doctor, pharmacy or effectiveness
        #[arg(long, default_value = "name")]
        sort: String,

        #[arg(long)]
        desc: bool,
    },

    /// Update fields on an existing medication
    Update {
        medication_id: Uuid,

        #[arg(long)]
        dosage: Option<String>,

        /// Replacement schedule, HH:MM (repeatable; replaces all times)
        #[arg(long = "time")]
        times: Vec<String>,

        #[arg(long)]
        quantity: Option<u32>,

        #[arg(long)]
        refill_date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,

        /// Activate or deactivate the medication
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a medication and its dose history
    Remove { medication_id: Uuid },

    /// List profiles
    Profiles,

    /// Add a profile
    AddProfile {
        name: String,

        #[arg(long, default_value = "Family member")]
        relationship: String,
    },

    /// Update fields on an existing profile
    EditProfile {
        profile_id: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        relationship: Option<String>,

        #[arg(long)]
        doctor: Option<String>,

        #[arg(long)]
        pharmacy: Option<String>,

        #[arg(long)]
        emergency_contact: Option<String>,
    },

    /// Delete a profile, its medications and their dose history
    RemoveProfile { profile_id: Uuid },

    /// Switch the active profile
    UseProfile { profile_id: Uuid },

    /// Show or change application settings
    Settings {
        #[arg(long)]
        dark_mode: Option<bool>,

        /// Enable or disable notifications
        #[arg(long)]
        notifications: Option<bool>,

        /// Reminder lead offsets in minutes, comma-separated (0 = at time)
        #[arg(long)]
        reminder_minutes: Option<String>,
    },

    /// Show adherence analytics for the current profile
    Stats,

    /// Adherence report for a clinician visit
    Report {
        /// Trailing window in days (30, 60 or 90)
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Also write the dose log as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show refill outlook for active medications
    Refills,

    /// Export a backup document
    Export { path: PathBuf },

    /// Replace all data from a backup document
    Import { path: PathBuf },

    /// Replace all data with reproducible demo data
    Seed {
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    medtrack_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    std::fs::create_dir_all(&data_dir)?;
    let store_path = data_dir.join("store.json");

    match cli.command {
        Some(Commands::Today) | None => cmd_today(&store_path, &config),
        Some(Commands::Take {
            dose_id,
            effectiveness,
            side_effects,
            notes,
        }) => cmd_take(&store_path, &dose_id, effectiveness, side_effects, notes),
        Some(Commands::Snooze { dose_id, minutes }) => {
            let minutes = minutes.unwrap_or(config.reminders.default_snooze_minutes);
            cmd_snooze(&store_path, &dose_id, minutes)
        }
        Some(Commands::Add {
            name,
            dosage,
            kind,
            frequency,
            times,
            quantity,
            doctor,
            pharmacy,
            refill_date,
            notes,
        }) => cmd_add(
            &store_path,
            name,
            dosage,
            &kind,
            &frequency,
            &times,
            quantity,
            doctor,
            pharmacy,
            refill_date,
            notes,
        ),
        Some(Commands::List {
            query,
            status,
            sort,
            desc,
        }) => cmd_list(&store_path, query, &status, &sort, desc),
        Some(Commands::Update {
            medication_id,
            dosage,
            times,
            quantity,
            refill_date,
            notes,
            active,
        }) => cmd_update(
            &store_path,
            medication_id,
            dosage,
            &times,
            quantity,
            refill_date,
            notes,
            active,
        ),
        Some(Commands::Remove { medication_id }) => cmd_remove(&store_path, medication_id),
        Some(Commands::Profiles) => cmd_profiles(&store_path),
        Some(Commands::AddProfile { name, relationship }) => {
            cmd_add_profile(&store_path, name, relationship)
        }
        Some(Commands::EditProfile {
            profile_id,
            name,
            relationship,
            doctor,
            pharmacy,
            emergency_contact,
        }) => cmd_edit_profile(
            &store_path,
            profile_id,
            name,
            relationship,
            doctor,
            pharmacy,
            emergency_contact,
        ),
        Some(Commands::RemoveProfile { profile_id }) => cmd_remove_profile(&store_path, profile_id),
        Some(Commands::UseProfile { profile_id }) => cmd_use_profile(&store_path, profile_id),
        Some(Commands::Settings {
            dark_mode,
            notifications,
            reminder_minutes,
        }) => cmd_settings(&store_path, dark_mode, notifications, reminder_minutes),
        Some(Commands::Stats) => cmd_stats(&store_path, &config),
        Some(Commands::Report { days, csv }) => cmd_report(&store_path, &config, days, csv),
        Some(Commands::Refills) => cmd_refills(&store_path),
        Some(Commands::Export { path }) => cmd_export(&store_path, &path),
        Some(Commands::Import { path }) => cmd_import(&store_path, &path),
        Some(Commands::Seed { seed }) => cmd_seed(&store_path, seed),
    }
}

fn status_marker(status: DoseStatus) -> &'static str {
    match status {
        DoseStatus::Taken => "✓",
        DoseStatus::Snoozed => "z",
        DoseStatus::Overdue => "!",
        DoseStatus::Upcoming => "→",
        DoseStatus::Scheduled => " ",
    }
}

fn cmd_today(store_path: &PathBuf, config: &Config) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    let now = Local::now().naive_local();
    let today = now.date();

    let created = store.generate_daily_doses(today)?;
    if created > 0 {
        println!("Generated {} dose records for today.", created);
    }

    let profile = store.current_profile().clone();
    println!("\nSchedule for {} — {}", profile.name, today);
    println!("─────────────────────────────────────────");

    let doses = store.doses_for_date(today);
    if doses.is_empty() {
        println!("  Nothing scheduled today.");
        return Ok(());
    }

    let window = chrono::Duration::minutes(i64::from(config.reminders.upcoming_window_minutes));
    for dose in doses {
        let name = store
            .medication(dose.medication_id)
            .map(|m| format!("{} {}", m.name, m.dosage))
            .unwrap_or_else(|| "(unknown medication)".into());
        let status = dose_status(dose, now, window);
        println!(
            "  {} {}  {}",
            status_marker(status),
            dose.scheduled_time.format("%H:%M"),
            name
        );
        println!("      id: {}", dose.id);
    }

    let summary = store.day_summary(today);
    println!("─────────────────────────────────────────");
    println!(
        "  {}/{} taken ({}%)",
        summary.completed, summary.total, summary.completion_rate
    );
    Ok(())
}

fn cmd_take(
    store_path: &PathBuf,
    dose_id: &str,
    effectiveness: Option<u8>,
    side_effects: Vec<String>,
    notes: Option<String>,
) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    let details = TakenDetails {
        effectiveness,
        side_effects,
        notes,
    };
    let now = Local::now().time();

    if store.mark_dose_taken(dose_id, details, now)? {
        println!("✓ Dose marked as taken.");
    } else {
        println!("Dose was already taken; nothing changed.");
    }
    Ok(())
}

fn cmd_snooze(store_path: &PathBuf, dose_id: &str, minutes: u32) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.snooze_dose(dose_id, minutes, Local::now().naive_local())?;
    println!("✓ Snoozed for {} minutes.", minutes);
    Ok(())
}

fn parse_kind(raw: &str) -> Result<MedicationKind> {
    match raw.to_lowercase().as_str() {
        "pill" => Ok(MedicationKind::Pill),
        "liquid" => Ok(MedicationKind::Liquid),
        "injection" => Ok(MedicationKind::Injection),
        "topical" => Ok(MedicationKind::Topical),
        other => Err(Error::Other(format!("unknown medication kind: {}", other))),
    }
}

fn parse_frequency(raw: &str) -> Result<Frequency> {
    match raw.to_lowercase().as_str() {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "as-needed" | "asneeded" | "prn" => Ok(Frequency::AsNeeded),
        other => Err(Error::Other(format!("unknown frequency: {}", other))),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    store_path: &PathBuf,
    name: String,
    dosage: String,
    kind: &str,
    frequency: &str,
    times: &[String],
    quantity: u32,
    doctor: String,
    pharmacy: String,
    refill_date: Option<NaiveDate>,
    notes: Option<String>,
) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;

    let mut parsed_times = Vec::new();
    for raw in times {
        let time = timefmt::parse_clock(raw)
            .ok_or_else(|| Error::Other(format!("invalid time {:?}, expected HH:MM", raw)))?;
        parsed_times.push(time);
    }

    let id = store.add_medication(NewMedication {
        profile_id: store.current_profile().id,
        name: name.clone(),
        dosage,
        kind: parse_kind(kind)?,
        frequency: parse_frequency(frequency)?,
        times: parsed_times,
        start_date: Local::now().date_naive(),
        refill_date,
        quantity,
        doctor,
        pharmacy,
        prescription_number: None,
        color: None,
        notes,
        side_effects: Vec::new(),
        effectiveness: None,
    })?;

    println!("✓ Added {} ({})", name, id);
    Ok(())
}

fn cmd_list(
    store_path: &PathBuf,
    query: Option<String>,
    status: &str,
    sort: &str,
    desc: bool,
) -> Result<()> {
    let store = MedicationStore::open(store_path)?;

    let status = match status.to_lowercase().as_str() {
        "active" => StatusFilter::Active,
        "inactive" => StatusFilter::Inactive,
        _ => StatusFilter::All,
    };
    let sort_by = match sort.to_lowercase().as_str() {
        "time" => SortKey::Time,
        "doctor" => SortKey::Doctor,
        "pharmacy" => SortKey::Pharmacy,
        "effectiveness" => SortKey::Effectiveness,
        _ => SortKey::Name,
    };
    let filters = SearchFilters {
        query: query.unwrap_or_default(),
        status,
        sort_by,
        sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
        ..Default::default()
    };

    let medications = store.search_medications(&filters);
    if medications.is_empty() {
        println!("No medications match.");
        return Ok(());
    }

    println!("Medications for {}:", store.current_profile().name);
    for med in medications {
        let times: Vec<String> = med
            .times
            .iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect();
        let flag = if med.is_active { "" } else { " [inactive]" };
        println!("  {} {} — {}{}", med.name, med.dosage, times.join(", "), flag);
        println!("      id: {}", med.id);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_update(
    store_path: &PathBuf,
    medication_id: Uuid,
    dosage: Option<String>,
    times: &[String],
    quantity: Option<u32>,
    refill_date: Option<NaiveDate>,
    notes: Option<String>,
    active: Option<bool>,
) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;

    let parsed_times = if times.is_empty() {
        None
    } else {
        let mut parsed = Vec::new();
        for raw in times {
            let time = timefmt::parse_clock(raw)
                .ok_or_else(|| Error::Other(format!("invalid time {:?}, expected HH:MM", raw)))?;
            parsed.push(time);
        }
        Some(parsed)
    };

    store.update_medication(
        medication_id,
        MedicationPatch {
            dosage,
            times: parsed_times,
            quantity,
            refill_date,
            notes,
            is_active: active,
            ..Default::default()
        },
    )?;
    println!("✓ Updated medication.");
    Ok(())
}

fn cmd_settings(
    store_path: &PathBuf,
    dark_mode: Option<bool>,
    notifications: Option<bool>,
    reminder_minutes: Option<String>,
) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;

    if dark_mode.is_some() || notifications.is_some() || reminder_minutes.is_some() {
        let reminder_minutes = reminder_minutes
            .map(|raw| {
                raw.split(',')
                    .map(|p| {
                        p.trim()
                            .parse::<u32>()
                            .map_err(|_| Error::Other(format!("invalid minutes value: {:?}", p)))
                    })
                    .collect::<Result<Vec<u32>>>()
            })
            .transpose()?;

        store.update_settings(SettingsPatch {
            dark_mode,
            notifications: Some(NotificationPatch {
                enabled: notifications,
                reminder_minutes,
                ..Default::default()
            }),
            ..Default::default()
        })?;
        println!("✓ Settings updated.");
    }

    let settings = store.settings();
    println!("  dark mode:        {}", settings.dark_mode);
    println!("  notifications:    {}", settings.notifications.enabled);
    println!(
        "  reminder minutes: {}",
        settings
            .notifications
            .reminder_minutes
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn cmd_remove(store_path: &PathBuf, medication_id: Uuid) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.delete_medication(medication_id)?;
    println!("✓ Removed medication and its dose history.");
    Ok(())
}

fn cmd_profiles(store_path: &PathBuf) -> Result<()> {
    let store = MedicationStore::open(store_path)?;
    let current = store.current_profile().id;

    for profile in store.profiles() {
        let marker = if profile.id == current { "*" } else { " " };
        println!("{} {} ({})", marker, profile.name, profile.relationship);
        println!("      id: {}", profile.id);
    }
    Ok(())
}

fn cmd_add_profile(store_path: &PathBuf, name: String, relationship: String) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    let id = store.add_profile(NewProfile {
        name: name.clone(),
        relationship,
        ..Default::default()
    })?;
    println!("✓ Added profile {} ({})", name, id);
    Ok(())
}

fn cmd_edit_profile(
    store_path: &PathBuf,
    profile_id: Uuid,
    name: Option<String>,
    relationship: Option<String>,
    doctor: Option<String>,
    pharmacy: Option<String>,
    emergency_contact: Option<String>,
) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.update_profile(
        profile_id,
        ProfilePatch {
            name,
            relationship,
            doctor,
            preferred_pharmacy: pharmacy,
            emergency_contact,
            ..Default::default()
        },
    )?;
    println!("✓ Updated profile.");
    Ok(())
}

fn cmd_remove_profile(store_path: &PathBuf, profile_id: Uuid) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.delete_profile(profile_id)?;
    println!(
        "✓ Removed profile; current profile is now {}.",
        store.current_profile().name
    );
    Ok(())
}

fn cmd_use_profile(store_path: &PathBuf, profile_id: Uuid) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.set_current_profile(profile_id)?;
    println!("✓ Switched to {}", store.current_profile().name);
    Ok(())
}

fn cmd_stats(store_path: &PathBuf, config: &Config) -> Result<()> {
    let store = MedicationStore::open(store_path)?;
    let analytics = store.analytics(Local::now().date_naive(), &config.analytics);

    println!("Adherence for {}:", store.current_profile().name);
    println!("  Compliance:     {}%", analytics.compliance_rate);
    println!("  Streak:         {} days", analytics.streak_days);
    println!(
        "  Doses:          {} taken, {} missed",
        analytics.total_doses_taken, analytics.total_doses_missed
    );
    if analytics.average_effectiveness > 0.0 {
        println!("  Effectiveness:  {:.1}/5", analytics.average_effectiveness);
    }
    if !analytics.common_side_effects.is_empty() {
        println!("  Side effects:   {}", analytics.common_side_effects.join(", "));
    }
    Ok(())
}

fn cmd_report(
    store_path: &PathBuf,
    config: &Config,
    days: u32,
    csv: Option<PathBuf>,
) -> Result<()> {
    let store = MedicationStore::open(store_path)?;
    let today = Local::now().date_naive();
    let report = store.clinician_report(today, days, &config.analytics);

    println!(
        "Adherence report: {} ({} to {})",
        report.profile.name, report.from, report.to
    );
    println!("  Overall compliance: {}%", report.analytics.compliance_rate);
    println!();
    for med in &report.medications {
        println!(
            "  {} {} — {}/{} taken ({}%)",
            med.name, med.dosage, med.doses_taken, med.doses_scheduled, med.compliance_rate
        );
        if let Some(avg) = med.average_effectiveness {
            println!("      effectiveness {:.1}/5", avg);
        }
        if !med.side_effects.is_empty() {
            println!("      side effects: {}", med.side_effects.join(", "));
        }
    }
    if !report.notes.is_empty() {
        println!("\n  Notes:");
        for note in &report.notes {
            println!("    {} {}: {}", note.date, note.medication_name, note.note);
        }
    }

    if let Some(csv_path) = csv {
        let rows = store.export_dose_log_csv(&csv_path, today, days)?;
        println!("\n✓ Wrote {} dose log rows to {}", rows, csv_path.display());
    }
    Ok(())
}

fn cmd_refills(store_path: &PathBuf) -> Result<()> {
    let store = MedicationStore::open(store_path)?;
    let projections = store.refill_projections(Local::now().date_naive());

    if projections.is_empty() {
        println!("No scheduled medications to project.");
        return Ok(());
    }

    for p in projections {
        let mut flags = Vec::new();
        if p.low_stock {
            flags.push("LOW STOCK");
        }
        if p.refill_due_soon {
            flags.push("REFILL DUE");
        } else if p.refillable {
            flags.push("refillable");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        println!(
            "  {} — {} units, ~{} days (runs out {}){}",
            p.name, p.quantity, p.days_of_stock, p.runs_out_on, flags
        );
    }
    Ok(())
}

fn cmd_export(store_path: &PathBuf, path: &PathBuf) -> Result<()> {
    let store = MedicationStore::open(store_path)?;
    store.export_json(path)?;
    println!("✓ Exported backup to {}", path.display());
    Ok(())
}

fn cmd_import(store_path: &PathBuf, path: &PathBuf) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.import_json(path)?;
    println!(
        "✓ Imported {} medications, {} doses, {} profiles.",
        store.medications().len(),
        store.doses().len(),
        store.profiles().len()
    );
    Ok(())
}

fn cmd_seed(store_path: &PathBuf, seed: u64) -> Result<()> {
    let mut store = MedicationStore::open(store_path)?;
    store.replace_state(demo_state(seed, Local::now().date_naive()))?;
    println!(
        "✓ Seeded demo data: {} profiles, {} medications, {} dose records.",
        store.profiles().len(),
        store.medications().len(),
        store.doses().len()
    );
    Ok(())
}

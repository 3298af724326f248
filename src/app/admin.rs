use log::info;
use std::error::Error;
use std::sync::Arc;
use super::Context;
use crate::admin::{ AdminDashboard, AdminError, Tab, TabData };
use crate::api::{ AdminApi, HttpAdminApi };
use crate::cli::{ AdminCommand, FaqCommand, UnknownCommand };
use crate::models::admin::{
    Analytics,
    DashboardStats,
    Faq,
    FaqDraft,
    FaqPage,
    FaqQuery,
    Pagination,
    Settings,
    UnknownPage,
    UnknownQuestion,
};
use crate::render::chart::{ category_chart, trend_chart };
use crate::text::truncate;

type AppResult = Result<(), Box<dyn Error + Send + Sync>>;

const LIST_TEXT_WIDTH: usize = 70;

fn print_pagination(pagination: Option<&Pagination>) {
    if let Some(p) = pagination {
        println!("Page {} of {} ({} total)", p.page, p.pages.max(1), p.total);
    }
}

fn print_unknown_list(questions: &[UnknownQuestion]) {
    if questions.is_empty() {
        println!("No unknown questions.");
        return;
    }
    for q in questions {
        let status = if q.answered { "answered" } else { "pending" };
        println!(
            "#{:<5} [{}] {}  {}",
            q.id,
            status,
            truncate(&q.question, LIST_TEXT_WIDTH),
            q.asked_at.as_deref().unwrap_or("")
        );
    }
}

fn print_unknown_page(page: &UnknownPage) {
    print_unknown_list(&page.questions);
    print_pagination(page.pagination.as_ref());
}

fn print_faq_page(page: &FaqPage) {
    if page.faqs.is_empty() {
        println!("No FAQs found.");
    }
    for faq in &page.faqs {
        println!(
            "#{:<5} [{}] {}",
            faq.id,
            faq.category.as_deref().unwrap_or("Uncategorized"),
            truncate(&faq.question, LIST_TEXT_WIDTH)
        );
    }
    print_pagination(page.pagination.as_ref());
    if !page.categories.is_empty() {
        println!("Categories: {}", page.categories.join(", "));
    }
}

fn print_faq(faq: &Faq) {
    println!("FAQ #{}", faq.id);
    println!("Category: {}", faq.category.as_deref().unwrap_or("Uncategorized"));
    println!("Q: {}", faq.question);
    println!("A: {}", faq.answer);
    if let Some(updated) = faq.updated_at.as_deref().or(faq.created_at.as_deref()) {
        println!("Last changed: {}", updated);
    }
}

fn print_overview(stats: &DashboardStats, recent_unknown: &[UnknownQuestion]) {
    println!("Total FAQs:          {}", stats.total_faqs);
    println!(
        "Unknown questions:   {} ({} pending, {} answered)",
        stats.unknown_total,
        stats.unknown_unanswered,
        stats.answered_count()
    );
    println!("Chats:               {} ({} today)", stats.total_chats, stats.chats_today);
    if !stats.popular_questions.is_empty() {
        println!("\nPopular questions:");
        for q in &stats.popular_questions {
            println!("  {:>4}x  {}", q.frequency, truncate(&q.user_message, LIST_TEXT_WIDTH));
        }
    }
    println!("\nFAQs by category:\n{}", category_chart(&stats.categories));
    println!("\nUnknown questions, last 7 days:\n{}", trend_chart(&stats.unknown_trend));
    println!("\nRecent unanswered:");
    print_unknown_list(recent_unknown);
}

fn print_analytics(analytics: &Analytics, days: u32) {
    println!("Total queries:    {}", analytics.total_queries);
    println!("Response rate:    {:.1}%", analytics.response_rate);
    println!("Pending unknown:  {}", analytics.pending_unknown);
    println!("\nChats per day (last {} days):\n{}", days, trend_chart(&analytics.daily_chats));
    println!("\nUnknown questions per day:\n{}", trend_chart(&analytics.daily_unknown));
}

fn print_settings(settings: &Settings) {
    println!("Similarity threshold:  {}", settings.similarity_threshold);
    println!("Exact threshold:       {}", settings.exact_threshold);
    println!("Suggestions enabled:   {}", settings.enable_suggestions);
    println!("Text-to-speech:        {}", settings.enable_tts);
    println!("Auto refresh:          {}", settings.auto_refresh);
}

/// Runs an operation that needs a live session: the cached token is verified first.
async fn authenticated(dashboard: &mut AdminDashboard) -> Result<(), AdminError> {
    if !dashboard.has_token() {
        return Err(AdminError::NotAuthenticated);
    }
    dashboard.verify_token().await
}

pub async fn run_admin(ctx: &Context, action: &AdminCommand) -> AppResult {
    let api: Arc<dyn AdminApi> = Arc::new(HttpAdminApi::from_config(&ctx.api_config)?);
    let assume_yes = matches!(action, AdminCommand::Faqs { action: FaqCommand::Delete { yes: true, .. } });
    let mut dashboard = AdminDashboard::open(
        api,
        ctx.store.clone(),
        ctx.notifier.clone(),
        ctx.confirm(assume_yes)
    ).await?;

    match action {
        AdminCommand::Login { username, password } => {
            dashboard.login(username, password).await?;
            return Ok(());
        }
        AdminCommand::Logout => {
            dashboard.logout().await?;
            return Ok(());
        }
        _ => {}
    }

    if let Err(e) = authenticated(&mut dashboard).await {
        return Err(format!("{} (run `faqdesk admin login` first)", e).into());
    }
    info!("Admin session verified");

    match action {
        AdminCommand::Login { .. } | AdminCommand::Logout => {}
        AdminCommand::Verify => println!("Token is valid."),
        AdminCommand::Stats => {
            if let TabData::Overview { stats, recent_unknown } = dashboard.switch_tab(Tab::Overview).await? {
                print_overview(&stats, &recent_unknown);
            }
        }
        AdminCommand::Analytics { days } => {
            dashboard.set_analytics_days(*days);
            if let TabData::Analytics(analytics) = dashboard.switch_tab(Tab::Analytics).await? {
                print_analytics(&analytics, *days);
            }
        }
        AdminCommand::Settings => {
            if let TabData::Settings(settings) = dashboard.switch_tab(Tab::Settings).await? {
                print_settings(&settings);
            }
        }
        AdminCommand::Unknown { action } => run_unknown(&mut dashboard, action).await?,
        AdminCommand::Faqs { action } => run_faqs(&mut dashboard, action).await?,
    }
    Ok(())
}

async fn run_unknown(dashboard: &mut AdminDashboard, action: &UnknownCommand) -> Result<(), AdminError> {
    match action {
        UnknownCommand::List { filter, page, limit } => {
            let page = dashboard.unknown_questions(*filter, *page, *limit).await?;
            print_unknown_page(&page);
        }
        UnknownCommand::Show { id } => {
            let q = dashboard.unknown_question(*id).await?;
            println!("Question #{}: {}", q.id, q.question);
            println!("Asked: {}", q.asked_at.as_deref().unwrap_or("unknown"));
            println!("Answered: {}", if q.answered { "yes" } else { "no" });
            if let Some(session) = &q.session_id {
                println!("Session: {}", session);
            }
        }
        UnknownCommand::Answer { id, answer, category } => {
            if let Some(faq_id) = dashboard.answer_unknown(*id, answer, category).await? {
                println!("Created FAQ #{}", faq_id);
            }
        }
    }
    Ok(())
}

async fn run_faqs(dashboard: &mut AdminDashboard, action: &FaqCommand) -> Result<(), AdminError> {
    match action {
        FaqCommand::List { page, limit, search, category } => {
            let query = FaqQuery {
                page: (*page).max(1),
                limit: (*limit).max(1),
                search: search.clone(),
                category: category.clone(),
            };
            let page = dashboard.faqs(&query).await?;
            print_faq_page(&page);
        }
        FaqCommand::Show { id } => {
            let faq = dashboard.faq(*id).await?;
            print_faq(&faq);
        }
        FaqCommand::Add { question, answer, category } => {
            let draft = FaqDraft { id: None, question: question.clone(), answer: answer.clone(), category: category.clone() };
            if let Some(id) = dashboard.save_faq(&draft).await? {
                println!("Created FAQ #{}", id);
            }
        }
        FaqCommand::Update { id, question, answer, category } => {
            let draft = FaqDraft {
                id: Some(*id),
                question: question.clone(),
                answer: answer.clone(),
                category: category.clone(),
            };
            dashboard.save_faq(&draft).await?;
        }
        FaqCommand::Delete { id, .. } => {
            if !dashboard.delete_faq(*id).await? {
                println!("FAQ #{} kept.", id);
            }
        }
    }
    Ok(())
}

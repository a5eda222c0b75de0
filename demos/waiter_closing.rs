//! Waiter closing example

use eventbar_core::utils::format_brl;
use eventbar_core::{
    Adjustment, BackOffice, Cents, ClosingHistory, ClosingInput, ClosingService,
    MemoryBackOffice, Person, Session, User, WaiterClosingForm,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("eventbar_core=info".parse()?))
        .init();

    println!("🍺 EventBar - Waiter Closing Example\n");

    let backend = MemoryBackOffice::new()
        .with_users(vec![User {
            cpf: "111.222.333-44".to_string(),
            name: "Fabio".to_string(),
            dob: "05/06/1985".to_string(),
            profile: "admin".to_string(),
            permissions: "financeiro".to_string(),
        }])
        .with_events(["Rodeio 2025"])
        .with_waiters(vec![Person::new("123.456.789-00", "Carlos Souza")]);

    // 1. Log in and pick the event
    let users = backend.list_users().await?;
    let mut session = Session::login(&users, "111.222.333-44", "05/06/1985")?;
    session.select_event("Rodeio 2025");
    println!("👤 Operator: {}", session.operator_name);

    // 2. Fill the closing
    let mut service = ClosingService::new(backend.clone());
    let waiter = service.waiters().await?.remove(0);
    let mut form = WaiterClosingForm::new(waiter, "M12");
    form.shirt_number = "7".to_string();
    form.input = ClosingInput {
        gross_sales: Cents::from_major(1500),
        credit: Cents::from_major(400),
        debit: Cents::from_major(150),
        instant_payment: Cents::from_major(100),
        stored_value: Cents::from_major(250),
        reversal: Adjustment::of(Cents::from_major(20)),
        ..ClosingInput::default()
    };

    // 3. Preview
    let preview = service.preview_waiter(&form);
    println!("\n📊 Preview");
    println!("  Comissão 8%:    {}", format_brl(preview.sales_commission));
    println!("  Comissão 4%:    {}", format_brl(preview.cashless_commission));
    println!("  Comissão Total: {}", format_brl(preview.commission_total));
    println!("  {}", preview.summary_line());

    // 4. Submit and read it back
    let receipt = service.submit_waiter(&session, &form).await?;
    println!("\n✅ Submitted, protocol {}", receipt.protocol);

    let history = ClosingHistory::new("Rodeio 2025", backend.list_closings("Rodeio 2025").await?);
    if let Some(record) = history.find(&receipt.protocol) {
        println!("\n{}", record.details_text());
    }

    Ok(())
}

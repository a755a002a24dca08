//! Page templates for dashboard views.

use chrono::{DateTime, Utc};
use lexdesk_core::money::{format_brl, format_growth, format_thousands};
use lexdesk_core::{
    Client, ClientType, Contract, ContractClause, ContractStatus, ContractTemplate, Document,
    DocumentStatus, LexdeskConfig, Project, ProjectStatus, Transaction, TransactionType, User,
    UserRole,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::calendar::{CalendarEvent, MonthGrid};
use crate::panels::{Panel, month_grid};
use crate::stats::{Alert, AlertKind, DashboardStats, StatsRange};
use crate::templates::{
    Field, badge, card, create_form, delete_button, empty_state, escape, layout, public_layout,
    row, stats_card, table,
};

// =============================================================================
// Labels
// =============================================================================

pub fn contract_status_badge(status: ContractStatus) -> String {
    let (label, color) = match status {
        ContractStatus::Draft => ("Rascunho", "gray"),
        ContractStatus::Active => ("Ativo", "green"),
        ContractStatus::Completed => ("Concluído", "blue"),
        ContractStatus::Cancelled => ("Cancelado", "red"),
    };
    badge(label, color)
}

pub fn project_status_badge(status: ProjectStatus) -> String {
    let (label, color) = match status {
        ProjectStatus::Planning => ("Planejamento", "yellow"),
        ProjectStatus::Active => ("Em andamento", "green"),
        ProjectStatus::OnHold => ("Pausado", "orange"),
        ProjectStatus::Completed => ("Concluído", "blue"),
        ProjectStatus::Cancelled => ("Cancelado", "red"),
    };
    badge(label, color)
}

pub fn document_status_badge(status: DocumentStatus) -> String {
    let (label, color) = match status {
        DocumentStatus::Active => ("Ativo", "green"),
        DocumentStatus::Archived => ("Arquivado", "gray"),
        DocumentStatus::Draft => ("Rascunho", "yellow"),
    };
    badge(label, color)
}

fn client_type_label(kind: ClientType) -> &'static str {
    match kind {
        ClientType::Individual => "Pessoa física",
        ClientType::Company => "Pessoa jurídica",
    }
}

fn role_label(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "Administrador",
        UserRole::Lawyer => "Advogado",
        UserRole::Assistant => "Assistente",
    }
}

fn alert_color(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Warning => "yellow",
        AlertKind::Info => "blue",
        AlertKind::Success => "green",
        AlertKind::Error => "red",
    }
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "—".to_string(), |d| d.format("%d/%m/%Y").to_string())
}

fn text(value: Option<&str>) -> String {
    value.map_or_else(|| "—".to_string(), escape)
}

/// Id to display name, for rendering foreign keys.
fn names<'a, T>(rows: &'a [T], f: impl Fn(&'a T) -> (&'a str, String)) -> HashMap<&'a str, String> {
    rows.iter().map(f).collect()
}

fn lookup(names: &HashMap<&str, String>, id: Option<&str>) -> String {
    id.and_then(|id| names.get(id))
        .map_or_else(|| "—".to_string(), |n| escape(n))
}

/// Select options for an optional foreign key.
fn options<T>(rows: &[T], f: impl Fn(&T) -> (String, String)) -> Vec<(String, String)> {
    std::iter::once((String::new(), "—".to_string()))
        .chain(rows.iter().map(f))
        .collect()
}

fn enum_options<T: Copy>(values: &[T], wire: fn(T) -> &'static str, label: fn(T) -> &'static str) -> Vec<(String, String)> {
    values
        .iter()
        .map(|v| (wire(*v).to_string(), label(*v).to_string()))
        .collect()
}

fn section(title: &str, icon: &str, rows: &[Vec<String>], headers: &[&str], empty: (&str, &str)) -> String {
    let body = if rows.is_empty() {
        empty_state(icon, empty.0, empty.1)
    } else {
        table(headers, rows)
    };
    card(title, icon, &body)
}

// =============================================================================
// Landing and dashboard
// =============================================================================

/// Public page shown at `/` without a session.
///
/// With `notice=auth_required` it tells the visitor they were bounced and
/// sends them on to the login form.
pub fn landing_page(notice: Option<&str>) -> String {
    let redirect_script = if notice == Some("auth_required") {
        r##"<script>
        document.addEventListener('DOMContentLoaded', function () {
            showToast('Acesso Negado', 'Você não está autenticado. Redirecionando...', 'error');
            setTimeout(function () { window.location.href = '/api/login'; }, 500);
        });
    </script>"##
    } else {
        ""
    };

    let content = format!(
        r##"<div class="max-w-3xl text-center text-white space-y-8">
        <div>
            <i class="fas fa-scale-balanced text-5xl mb-4"></i>
            <h1 class="text-4xl font-bold">Lexdesk</h1>
            <p class="text-lg text-primary-100 mt-2">Clientes, contratos, projetos e finanças do seu escritório em um só lugar.</p>
        </div>
        <div class="grid gap-4 md:grid-cols-3 text-left">
            <div class="bg-white/10 rounded-xl p-5"><i class="fas fa-file-contract mb-2"></i><h3 class="font-semibold">Contratos</h3><p class="text-sm text-primary-100">Minutas, cláusulas e prazos de vencimento.</p></div>
            <div class="bg-white/10 rounded-xl p-5"><i class="fas fa-briefcase mb-2"></i><h3 class="font-semibold">Projetos</h3><p class="text-sm text-primary-100">Acompanhe cada caso do início à entrega.</p></div>
            <div class="bg-white/10 rounded-xl p-5"><i class="fas fa-sack-dollar mb-2"></i><h3 class="font-semibold">Financeiro</h3><p class="text-sm text-primary-100">Receitas, despesas e crescimento.</p></div>
        </div>
        <a href="/api/login" class="inline-flex items-center gap-2 bg-white text-primary-700 font-semibold px-6 py-3 rounded-lg shadow-lg hover:bg-primary-50">
            <i class="fas fa-sign-in-alt"></i> Entrar
        </a>
    </div>
    {redirect_script}"##
    );
    public_layout("Bem-vindo", &content)
}

pub fn dashboard_page(user: &User, stats: &DashboardStats, alerts: &[Alert], range: StatsRange) -> String {
    let alerts_html: String = alerts
        .iter()
        .map(|a| {
            let color = alert_color(a.kind);
            format!(
                r##"<div x-data="{{ show: true }}" x-show="show" class="flex items-start justify-between gap-4 p-4 rounded-lg border border-{color}-200 bg-{color}-50">
                    <div>
                        <p class="font-medium text-{color}-800">{title}</p>
                        <p class="text-sm text-{color}-700">{message}</p>
                    </div>
                    <button @click="show = false" class="text-sm text-{color}-700 hover:underline">Dispensar</button>
                </div>"##,
                title = escape(&a.title),
                message = escape(&a.message),
            )
        })
        .collect();

    let range_options: String = StatsRange::ALL
        .iter()
        .map(|r| {
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = r.as_str(),
                selected = if *r == range { " selected" } else { "" },
                label = r.label(),
            )
        })
        .collect();

    let cards = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-6">
            {revenue}{contracts}{clients}{pending}
        </div>"##,
        revenue = stats_card(
            "Receita Total",
            &format_thousands(stats.total_revenue),
            Some(&format_growth(stats.revenue_growth)),
            "dollar-sign",
            "green"
        ),
        contracts = stats_card(
            "Contratos Ativos",
            &stats.active_contracts.to_string(),
            Some(&format_growth(stats.contracts_growth)),
            "file-contract",
            "blue"
        ),
        clients = stats_card(
            "Total de Clientes",
            &stats.total_clients.to_string(),
            Some(&format_growth(stats.clients_growth)),
            "users",
            "purple"
        ),
        pending = stats_card("Tarefas Pendentes", &stats.pending_tasks.to_string(), None, "list-check", "yellow"),
    );

    let tab_buttons: String = Panel::ALL
        .iter()
        .map(|p| {
            format!(
                r##"<button @click="tab = '{name}'; $dispatch('panel-{name}')"
                    :class="tab === '{name}' ? 'border-primary-600 text-primary-700' : 'border-transparent text-gray-500 hover:text-gray-700'"
                    class="flex items-center gap-2 px-4 py-3 border-b-2 font-medium text-sm">
                    <i class="fas fa-{icon}"></i> {label}
                </button>"##,
                name = p.as_str(),
                icon = p.icon(),
                label = p.label(),
            )
        })
        .collect();

    let panels: String = Panel::ALL
        .iter()
        .map(|p| {
            let name = p.as_str();
            let trigger = if *p == Panel::Overview {
                "load".to_string()
            } else {
                format!("panel-{name} from:body once")
            };
            format!(
                r##"<div id="panel-{name}" x-show="tab === '{name}'" x-cloak
                    hx-get="/dashboard/panels/{name}?range={range}" hx-trigger="{trigger}" hx-swap="innerHTML">
                    <div class="text-center py-12 text-gray-400"><i class="fas fa-spinner fa-spin text-2xl"></i></div>
                </div>"##,
                range = range.as_str(),
            )
        })
        .collect();

    let content = format!(
        r##"<div class="space-y-4">{alerts_html}</div>
        <div class="flex justify-end">
            <select onchange="window.location.search = '?range=' + this.value"
                class="px-4 py-2 border border-gray-300 rounded-lg bg-white text-sm">{range_options}</select>
        </div>
        {cards}
        <div x-data="{{ tab: 'overview' }}" class="space-y-6">
            <div class="flex gap-2 border-b border-gray-200">{tab_buttons}</div>
            {panels}
        </div>"##
    );

    let subtitle = format!("Bem-vindo(a), {}", user.display_name());
    layout("Dashboard", &subtitle, user, &content)
}

// =============================================================================
// Entity pages
// =============================================================================

pub fn clients_page(user: &User, clients: &[Client]) -> String {
    let rows: Vec<Vec<String>> = clients
        .iter()
        .map(|c| {
            vec![
                escape(&c.name),
                badge(client_type_label(c.client_type), "blue"),
                text(c.email.as_deref()),
                text(c.phone.as_deref()),
                text(c.document()),
                delete_button(&format!("/api/clients/{}", c.id)),
            ]
        })
        .collect();

    let form = create_form(
        "/api/clients",
        "Novo cliente",
        &[
            Field::Text { name: "name", label: "Nome", required: true },
            Field::Select {
                name: "type",
                label: "Tipo",
                options: enum_options(ClientType::ALL, ClientType::as_str, client_type_label),
            },
            Field::Text { name: "email", label: "E-mail", required: false },
            Field::Text { name: "phone", label: "Telefone", required: false },
            Field::Text { name: "personalDocument", label: "CPF", required: false },
            Field::Text { name: "companyDocument", label: "CNPJ", required: false },
            Field::Text { name: "address", label: "Endereço", required: false },
            Field::TextArea { name: "notes", label: "Observações", required: false },
        ],
    );

    let list = section(
        "Clientes",
        "users",
        &rows,
        &["Nome", "Tipo", "E-mail", "Telefone", "Documento", ""],
        ("Nenhum cliente", "Cadastre o primeiro cliente do escritório."),
    );
    layout("Clientes", "Pessoas e empresas atendidas", user, &format!("{form}{list}"))
}

pub fn contracts_page(
    user: &User,
    contracts: &[Contract],
    templates: &[ContractTemplate],
    clauses: &[ContractClause],
    clients: &[Client],
) -> String {
    let client_names = names(clients, |c| (c.id.as_str(), c.name.clone()));
    let rows: Vec<Vec<String>> = contracts
        .iter()
        .map(|c| {
            vec![
                escape(&c.title),
                lookup(&client_names, c.client_id.as_deref()),
                c.value.map_or_else(|| "—".to_string(), format_brl),
                date(c.start_date),
                date(c.end_date),
                contract_status_badge(c.status),
                delete_button(&format!("/api/contracts/{}", c.id)),
            ]
        })
        .collect();

    let contract_form = create_form(
        "/api/contracts",
        "Novo contrato",
        &[
            Field::Text { name: "title", label: "Título", required: true },
            Field::Select {
                name: "clientId",
                label: "Cliente",
                options: options(clients, |c| (c.id.clone(), c.name.clone())),
            },
            Field::Number { name: "value", label: "Valor (R$)", required: false },
            Field::Select {
                name: "status",
                label: "Situação",
                options: vec![
                    ("draft".into(), "Rascunho".into()),
                    ("active".into(), "Ativo".into()),
                    ("completed".into(), "Concluído".into()),
                    ("cancelled".into(), "Cancelado".into()),
                ],
            },
            Field::Date { name: "startDate", label: "Início" },
            Field::Date { name: "endDate", label: "Término" },
            Field::TextArea { name: "description", label: "Descrição", required: false },
            Field::TextArea { name: "content", label: "Conteúdo", required: false },
        ],
    );

    let template_rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| {
            vec![
                escape(&t.name),
                text(t.category.as_deref()),
                active_badge(t.is_active),
                delete_button(&format!("/api/contract-templates/{}", t.id)),
            ]
        })
        .collect();
    let template_form = create_form(
        "/api/contract-templates",
        "Nova minuta",
        &[
            Field::Text { name: "name", label: "Nome", required: true },
            Field::Text { name: "category", label: "Categoria", required: false },
            Field::TextArea { name: "content", label: "Texto", required: true },
            Field::TextArea { name: "description", label: "Descrição", required: false },
            Field::Checkbox { name: "isActive", label: "Ativa", checked: true },
        ],
    );

    let clause_rows: Vec<Vec<String>> = clauses
        .iter()
        .map(|c| {
            vec![
                escape(&c.title),
                text(c.category.as_deref()),
                active_badge(c.is_active),
                delete_button(&format!("/api/contract-clauses/{}", c.id)),
            ]
        })
        .collect();
    let clause_form = create_form(
        "/api/contract-clauses",
        "Nova cláusula",
        &[
            Field::Text { name: "title", label: "Título", required: true },
            Field::Text { name: "category", label: "Categoria", required: false },
            Field::TextArea { name: "content", label: "Texto", required: true },
            Field::Checkbox { name: "isActive", label: "Ativa", checked: true },
        ],
    );

    let content = [
        contract_form,
        section(
            "Contratos",
            "file-contract",
            &rows,
            &["Título", "Cliente", "Valor", "Início", "Término", "Situação", ""],
            ("Nenhum contrato", "Crie um contrato a partir de uma minuta ou do zero."),
        ),
        template_form,
        section(
            "Minutas",
            "file-lines",
            &template_rows,
            &["Nome", "Categoria", "Situação", ""],
            ("Nenhuma minuta", "Modelos reutilizáveis aparecem aqui."),
        ),
        clause_form,
        section(
            "Cláusulas",
            "paragraph",
            &clause_rows,
            &["Título", "Categoria", "Situação", ""],
            ("Nenhuma cláusula", "Cadastre cláusulas para montar contratos."),
        ),
    ]
    .join("");
    layout("Contratos", "Contratos, minutas e cláusulas", user, &content)
}

fn active_badge(active: bool) -> String {
    if active {
        badge("Ativa", "green")
    } else {
        badge("Inativa", "gray")
    }
}

pub fn projects_page(user: &User, projects: &[Project], clients: &[Client], users: &[User]) -> String {
    let client_names = names(clients, |c| (c.id.as_str(), c.name.clone()));
    let user_names = names(users, |u| (u.id.as_str(), u.display_name()));
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            vec![
                escape(&p.name),
                lookup(&client_names, p.client_id.as_deref()),
                lookup(&user_names, p.assigned_to.as_deref()),
                date(p.start_date),
                date(p.end_date),
                project_status_badge(p.status),
                delete_button(&format!("/api/projects/{}", p.id)),
            ]
        })
        .collect();

    let form = create_form(
        "/api/projects",
        "Novo projeto",
        &[
            Field::Text { name: "name", label: "Nome", required: true },
            Field::Select {
                name: "clientId",
                label: "Cliente",
                options: options(clients, |c| (c.id.clone(), c.name.clone())),
            },
            Field::Select {
                name: "assignedTo",
                label: "Responsável",
                options: options(users, |u| (u.id.clone(), u.display_name())),
            },
            Field::Select {
                name: "status",
                label: "Situação",
                options: vec![
                    ("planning".into(), "Planejamento".into()),
                    ("active".into(), "Em andamento".into()),
                    ("on_hold".into(), "Pausado".into()),
                    ("completed".into(), "Concluído".into()),
                    ("cancelled".into(), "Cancelado".into()),
                ],
            },
            Field::Date { name: "startDate", label: "Início" },
            Field::Date { name: "endDate", label: "Entrega" },
            Field::TextArea { name: "description", label: "Descrição", required: false },
        ],
    );

    let list = section(
        "Projetos",
        "briefcase",
        &rows,
        &["Nome", "Cliente", "Responsável", "Início", "Entrega", "Situação", ""],
        ("Nenhum projeto", "Abra um projeto para acompanhar um caso."),
    );
    layout("Projetos", "Casos e demandas em andamento", user, &format!("{form}{list}"))
}

pub fn documents_page(user: &User, documents: &[Document], clients: &[Client], projects: &[Project]) -> String {
    let client_names = names(clients, |c| (c.id.as_str(), c.name.clone()));
    let project_names = names(projects, |p| (p.id.as_str(), p.name.clone()));
    let rows: Vec<Vec<String>> = documents
        .iter()
        .map(|d| {
            vec![
                escape(&d.name),
                escape(&d.document_type),
                lookup(&client_names, d.client_id.as_deref()),
                lookup(&project_names, d.project_id.as_deref()),
                document_status_badge(d.status),
                d.created_at.format("%d/%m/%Y").to_string(),
                delete_button(&format!("/api/documents/{}", d.id)),
            ]
        })
        .collect();

    let form = create_form(
        "/api/documents",
        "Novo documento",
        &[
            Field::Text { name: "name", label: "Nome", required: true },
            Field::Text { name: "type", label: "Tipo", required: true },
            Field::Text { name: "filePath", label: "Arquivo", required: false },
            Field::Select {
                name: "clientId",
                label: "Cliente",
                options: options(clients, |c| (c.id.clone(), c.name.clone())),
            },
            Field::Select {
                name: "projectId",
                label: "Projeto",
                options: options(projects, |p| (p.id.clone(), p.name.clone())),
            },
            Field::Select {
                name: "status",
                label: "Situação",
                options: vec![
                    ("active".into(), "Ativo".into()),
                    ("draft".into(), "Rascunho".into()),
                    ("archived".into(), "Arquivado".into()),
                ],
            },
        ],
    );

    let list = section(
        "Documentos",
        "folder-open",
        &rows,
        &["Nome", "Tipo", "Cliente", "Projeto", "Situação", "Enviado em", ""],
        ("Nenhum documento", "Peças, procurações e anexos aparecem aqui."),
    );
    layout("Documentos", "Arquivos do escritório", user, &format!("{form}{list}"))
}

pub fn financial_page(user: &User, transactions: &[Transaction], clients: &[Client]) -> String {
    let sum = |kind: TransactionType| -> Decimal {
        transactions
            .iter()
            .filter(|t| t.transaction_type == kind)
            .map(|t| t.amount)
            .sum()
    };
    let income = sum(TransactionType::Income);
    let expense = sum(TransactionType::Expense);
    let balance = income - expense;

    let totals = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-3 gap-6">{}{}{}</div>"##,
        stats_card("Receitas", &format_brl(income), None, "arrow-trend-up", "green"),
        stats_card("Despesas", &format_brl(expense), None, "arrow-trend-down", "red"),
        stats_card(
            "Saldo",
            &format_brl(balance),
            None,
            "scale-balanced",
            if balance.is_sign_negative() { "red" } else { "blue" }
        ),
    );

    let client_names = names(clients, |c| (c.id.as_str(), c.name.clone()));
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|t| {
            let (label, color) = match t.transaction_type {
                TransactionType::Income => ("Receita", "green"),
                TransactionType::Expense => ("Despesa", "red"),
            };
            vec![
                t.date.format("%d/%m/%Y").to_string(),
                escape(&t.description),
                badge(label, color),
                lookup(&client_names, t.client_id.as_deref()),
                format_brl(t.amount),
                delete_button(&format!("/api/transactions/{}", t.id)),
            ]
        })
        .collect();

    let form = create_form(
        "/api/transactions",
        "Novo lançamento",
        &[
            Field::Text { name: "description", label: "Descrição", required: true },
            Field::Number { name: "amount", label: "Valor (R$)", required: true },
            Field::Select {
                name: "type",
                label: "Tipo",
                options: vec![
                    ("income".into(), "Receita".into()),
                    ("expense".into(), "Despesa".into()),
                ],
            },
            Field::Date { name: "date", label: "Data" },
            Field::Select {
                name: "clientId",
                label: "Cliente",
                options: options(clients, |c| (c.id.clone(), c.name.clone())),
            },
        ],
    );

    let list = section(
        "Lançamentos",
        "receipt",
        &rows,
        &["Data", "Descrição", "Tipo", "Cliente", "Valor", ""],
        ("Nenhum lançamento", "Registre receitas e despesas do escritório."),
    );
    layout("Financeiro", "Receitas e despesas", user, &format!("{totals}{form}{list}"))
}

pub fn suppliers_page(user: &User) -> String {
    let body = empty_state(
        "truck",
        "Nenhum fornecedor",
        "O cadastro de fornecedores ainda não está disponível.",
    );
    layout("Fornecedores", "Prestadores de serviço", user, &card("Fornecedores", "truck", &body))
}

pub fn employees_page(user: &User, users: &[User]) -> String {
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            let mut cells = vec![
                escape(&u.display_name()),
                text(u.email.as_deref()),
                badge(role_label(u.role), if u.is_admin() { "purple" } else { "blue" }),
                u.created_at.format("%d/%m/%Y").to_string(),
            ];
            if user.is_admin() && u.id != user.id {
                cells.push(delete_button(&format!("/api/users/{}", u.id)));
            } else {
                cells.push(String::new());
            }
            cells
        })
        .collect();

    let form = if user.is_admin() {
        create_form(
            "/api/users",
            "Novo membro da equipe",
            &[
                Field::Text { name: "firstName", label: "Nome", required: true },
                Field::Text { name: "lastName", label: "Sobrenome", required: false },
                Field::Text { name: "email", label: "E-mail", required: true },
                Field::Text { name: "password", label: "Senha inicial", required: false },
                Field::Select {
                    name: "role",
                    label: "Perfil",
                    options: enum_options(
                        &[UserRole::Assistant, UserRole::Lawyer, UserRole::Admin],
                        UserRole::as_str,
                        role_label,
                    ),
                },
            ],
        )
    } else {
        String::new()
    };

    let list = section(
        "Equipe",
        "id-badge",
        &rows,
        &["Nome", "E-mail", "Perfil", "Desde", ""],
        ("Nenhum usuário", "Convide advogados e assistentes."),
    );
    layout("Equipe", "Advogados e assistentes", user, &format!("{form}{list}"))
}

pub fn settings_page(user: &User, config: &LexdeskConfig, backend: &str) -> String {
    let body = [
        row("Projeto", &text(config.project.as_deref())),
        row("Banco de dados", &badge(backend, "blue")),
        row("Fonte das estatísticas", &badge(&format!("{:?}", config.dashboard.stats_source).to_lowercase(), "purple")),
        row("Cache de consultas", &format!("{} s", config.dashboard.cache_ttl_seconds)),
        row("Duração da sessão", &format!("{} h", config.auth.session_ttl_hours)),
        row("Endereço", &escape(&config.dashboard.bind_address())),
    ]
    .join("");
    let content = card(
        "Configuração",
        "gear",
        &format!(r#"<div class="space-y-4">{body}</div>"#),
    );
    layout("Configurações", "Parâmetros do sistema (lexdesk.yaml)", user, &content)
}

pub fn profile_page(user: &User) -> String {
    let body = [
        row("Nome", &escape(&user.display_name())),
        row("E-mail", &text(user.email.as_deref())),
        row("Perfil", &badge(role_label(user.role), "blue")),
        row("Membro desde", &user.created_at.format("%d/%m/%Y").to_string()),
    ]
    .join("");
    let avatar = user.profile_image_url.as_deref().map_or_else(
        || r#"<i class="fas fa-user-circle text-6xl text-gray-300"></i>"#.to_string(),
        |url| format!(r#"<img src="{}" alt="" class="w-16 h-16 rounded-full object-cover">"#, escape(url)),
    );
    let content = card(
        "Meu perfil",
        "user",
        &format!(r#"<div class="flex gap-6 items-start">{avatar}<div class="flex-1 space-y-4">{body}</div></div>"#),
    );
    layout("Perfil", "Seus dados de acesso", user, &content)
}

pub fn calendar_page(user: &User, grid: &MonthGrid, events: &[CalendarEvent]) -> String {
    let nav = format!(
        r##"<div class="flex items-center justify-between">
            <a href="/calendar?month={prev}" class="px-3 py-2 rounded-lg border border-gray-300 bg-white hover:bg-gray-50"><i class="fas fa-chevron-left"></i></a>
            <h2 class="text-lg font-semibold text-gray-900">{title}</h2>
            <a href="/calendar?month={next}" class="px-3 py-2 rounded-lg border border-gray-300 bg-white hover:bg-gray-50"><i class="fas fa-chevron-right"></i></a>
        </div>"##,
        prev = grid.prev_param(),
        next = grid.next_param(),
        title = grid.title(),
    );
    let month: Vec<CalendarEvent> = events.iter().filter(|e| grid.contains(e.date)).cloned().collect();
    let list: Vec<Vec<String>> = month
        .iter()
        .map(|e| {
            vec![
                e.date.format("%d/%m/%Y").to_string(),
                badge(e.kind.label(), e.kind.color()),
                format!(r#"<a href="{}" class="text-primary-600 hover:underline">{}</a>"#, e.kind.link(), escape(&e.title)),
            ]
        })
        .collect();
    let agenda = section(
        "Compromissos do mês",
        "list",
        &list,
        &["Data", "Evento", "Título"],
        ("Nada agendado", "Datas de contratos e projetos aparecem aqui."),
    );
    layout(
        "Agenda",
        "Prazos de contratos e projetos",
        user,
        &format!("{nav}{}{agenda}", month_grid(grid, &month)),
    )
}

pub fn not_found_page(user: Option<&User>, path: &str) -> String {
    let body = format!(
        r##"{}
        <div class="text-center"><a href="/" class="text-primary-600 hover:underline">Voltar ao início</a></div>"##,
        empty_state(
            "compass",
            "Página não encontrada",
            &format!("O endereço {} não existe.", escape(path)),
        )
    );
    match user {
        Some(user) => layout("Página não encontrada", "Erro 404", user, &card("404", "triangle-exclamation", &body)),
        None => public_layout(
            "Página não encontrada",
            &format!(r#"<div class="bg-white rounded-2xl shadow-2xl p-8 max-w-md w-full">{body}</div>"#),
        ),
    }
}

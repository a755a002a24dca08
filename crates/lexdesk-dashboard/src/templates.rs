//! HTML building blocks.
//!
//! Pages are plain `format!` templates styled with Tailwind CSS; HTMX talks
//! to the JSON API and Alpine.js drives tabs and toasts.

use lexdesk_core::User;

/// Escape text for HTML bodies and attribute values.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn head(title: &str) -> String {
    format!(
        r##"<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Lexdesk</title>
    <script src="https://cdn.tailwindcss.com"></script>
    <script>
        tailwind.config = {{
            theme: {{
                extend: {{
                    colors: {{
                        primary: {{
                            50: '#eff6ff',
                            100: '#dbeafe',
                            500: '#3b82f6',
                            600: '#2563eb',
                            700: '#1d4ed8',
                            800: '#1e40af',
                            900: '#1e3a8a',
                        }}
                    }}
                }}
            }}
        }}
    </script>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script defer src="https://unpkg.com/alpinejs@3.x.x/dist/cdn.min.js"></script>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
    <link rel="stylesheet" href="/static/lexdesk.css">
    <script src="/static/lexdesk.js"></script>
</head>"##,
        title = escape(title),
    )
}

/// Signed-in layout: top bar, sidebar and content.
pub fn layout(title: &str, subtitle: &str, user: &User, content: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="pt-BR" x-data="{{ sidebarOpen: true }}">
{HEAD}
<body class="bg-gradient-to-br from-gray-50 to-blue-50 min-h-screen">
    {NAV}
    <div class="flex">
        {SIDEBAR}
        <main class="flex-1 p-6 lg:p-8">
            <div class="max-w-7xl mx-auto space-y-6">
                <div>
                    <h1 class="text-2xl font-bold text-gray-900">{title}</h1>
                    <p class="text-gray-500">{subtitle}</p>
                </div>
                {content}
            </div>
        </main>
    </div>
    {TOAST}
</body>
</html>"##,
        HEAD = head(title),
        NAV = nav_template(user),
        SIDEBAR = sidebar_template(),
        TOAST = toast_template(),
        title = escape(title),
        subtitle = escape(subtitle),
    )
}

/// Bare layout for the landing, login and error pages.
pub fn public_layout(title: &str, content: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="pt-BR">
{HEAD}
<body class="bg-gradient-to-br from-primary-600 via-primary-700 to-primary-900 min-h-screen flex items-center justify-center p-4">
    {content}
    {TOAST}
</body>
</html>"##,
        HEAD = head(title),
        TOAST = toast_template(),
    )
}

fn nav_template(user: &User) -> String {
    format!(
        r##"<nav class="bg-white border-b border-gray-200 px-4 py-3 sticky top-0 z-40 shadow-sm">
        <div class="flex items-center justify-between">
            <div class="flex items-center gap-4">
                <button @click="sidebarOpen = !sidebarOpen" class="p-2 hover:bg-gray-100 rounded-lg lg:hidden">
                    <i class="fas fa-bars"></i>
                </button>
                <a href="/" class="flex items-center gap-2 text-primary-700 font-bold text-lg">
                    <i class="fas fa-scale-balanced"></i> Lexdesk
                </a>
            </div>
            <div class="flex items-center gap-4 text-sm">
                <a href="/profile" class="flex items-center gap-2 text-gray-700 hover:text-primary-600">
                    <i class="fas fa-user-circle"></i> {name}
                </a>
                <a href="/api/logout" class="text-gray-500 hover:text-red-600" title="Sair">
                    <i class="fas fa-right-from-bracket"></i>
                </a>
            </div>
        </div>
    </nav>"##,
        name = escape(&user.display_name()),
    )
}

const SIDEBAR_LINKS: &[(&str, &str, &str)] = &[
    ("/", "gauge", "Dashboard"),
    ("/clients", "users", "Clientes"),
    ("/contracts", "file-contract", "Contratos"),
    ("/projects", "briefcase", "Projetos"),
    ("/documents", "folder-open", "Documentos"),
    ("/financial", "sack-dollar", "Financeiro"),
    ("/calendar", "calendar-days", "Agenda"),
    ("/suppliers", "truck", "Fornecedores"),
    ("/employees", "id-badge", "Equipe"),
    ("/settings", "gear", "Configurações"),
];

fn sidebar_template() -> String {
    let links: String = SIDEBAR_LINKS
        .iter()
        .map(|(href, icon, label)| {
            format!(
                r##"<a href="{href}" class="flex items-center gap-3 px-4 py-3 text-gray-700 hover:bg-primary-50 rounded-lg transition-colors"
                   :class="{{ 'bg-primary-50 text-primary-600': window.location.pathname === '{href}' }}">
                    <i class="fas fa-{icon} w-5"></i>
                    <span>{label}</span>
                </a>"##
            )
        })
        .collect();

    format!(
        r##"<aside class="w-64 bg-white border-r border-gray-200 min-h-[calc(100vh-57px)] transition-all duration-300"
              :class="{{ '-ml-64': !sidebarOpen }}" x-cloak>
            <nav class="p-4 space-y-1">{links}</nav>
        </aside>"##
    )
}

fn toast_template() -> &'static str {
    r##"<div id="toast" class="hidden fixed bottom-4 right-4 bg-green-500 text-white px-6 py-3 rounded-lg shadow-lg z-50 transition-all">
        <p id="toast-title" class="font-semibold"></p>
        <p id="toast-message" class="text-sm"></p>
    </div>"##
}

pub fn card(title: &str, icon: &str, content: &str) -> String {
    format!(
        r##"<div class="bg-white rounded-xl shadow-sm border border-gray-200 overflow-hidden">
            <div class="px-6 py-4 border-b border-gray-200 flex items-center gap-2">
                <i class="fas fa-{icon} text-primary-600"></i>
                <h3 class="text-lg font-semibold text-gray-900">{title}</h3>
            </div>
            <div class="p-6">
                {content}
            </div>
        </div>"##
    )
}

/// Headline figure with an optional growth line.
pub fn stats_card(title: &str, value: &str, growth: Option<&str>, icon: &str, color: &str) -> String {
    let growth_html = growth.map_or(String::new(), |g| {
        let tone = if g.starts_with('-') { "text-red-600" } else { "text-green-600" };
        format!(r#"<p class="text-sm {tone} mt-1">{g} <span class="text-gray-400">vs. período anterior</span></p>"#)
    });
    format!(
        r##"<div class="bg-white rounded-xl shadow-sm border border-gray-200 p-6">
            <div class="flex items-center justify-between">
                <div>
                    <p class="text-sm text-gray-500">{title}</p>
                    <p class="text-2xl font-bold text-gray-900 mt-1">{value}</p>
                    {growth_html}
                </div>
                <div class="w-12 h-12 rounded-full bg-{color}-100 flex items-center justify-center">
                    <i class="fas fa-{icon} text-{color}-500 text-xl"></i>
                </div>
            </div>
        </div>"##
    )
}

pub fn badge(text: &str, color: &str) -> String {
    format!(
        r##"<span class="inline-flex items-center px-2.5 py-0.5 rounded-full text-xs font-medium bg-{color}-100 text-{color}-800">{text}</span>"##
    )
}

/// Label and value on one line, as used in the summary cards.
pub fn row(label: &str, value: &str) -> String {
    format!(
        r##"<div class="flex justify-between items-center">
            <span class="text-sm text-gray-600">{label}</span>
            {value}
        </div>"##
    )
}

pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let headers_html: String = headers
        .iter()
        .map(|h| format!(r#"<th class="px-6 py-3 text-left text-xs font-medium text-gray-500 uppercase tracking-wider">{h}</th>"#))
        .collect();

    let rows_html: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!(r#"<td class="px-6 py-4 whitespace-nowrap text-sm text-gray-900">{cell}</td>"#))
                .collect();
            format!(r#"<tr class="hover:bg-gray-50">{cells}</tr>"#)
        })
        .collect();

    format!(
        r##"<div class="overflow-x-auto">
            <table class="min-w-full divide-y divide-gray-200">
                <thead class="bg-gray-50">
                    <tr>{headers_html}</tr>
                </thead>
                <tbody class="bg-white divide-y divide-gray-200">
                    {rows_html}
                </tbody>
            </table>
        </div>"##
    )
}

pub fn empty_state(icon: &str, title: &str, description: &str) -> String {
    format!(
        r##"<div class="text-center py-12">
            <i class="fas fa-{icon} text-4xl text-gray-400 mb-4"></i>
            <h3 class="text-lg font-medium text-gray-900">{title}</h3>
            <p class="mt-1 text-gray-500">{description}</p>
        </div>"##
    )
}

/// A form field for [`create_form`].
pub enum Field<'a> {
    Text { name: &'a str, label: &'a str, required: bool },
    TextArea { name: &'a str, label: &'a str, required: bool },
    Number { name: &'a str, label: &'a str, required: bool },
    Date { name: &'a str, label: &'a str },
    /// Options are `(value, text)`; the first is preselected.
    Select { name: &'a str, label: &'a str, options: Vec<(String, String)> },
    Checkbox { name: &'a str, label: &'a str, checked: bool },
}

impl Field<'_> {
    fn render(&self) -> String {
        const INPUT: &str = "w-full px-4 py-2 border border-gray-300 rounded-lg bg-white text-gray-900 focus:ring-2 focus:ring-primary-500 focus:border-primary-500";
        let req = |r: &bool| if *r { " required" } else { "" };
        match self {
            Field::Text { name, label, required } => labelled(
                name,
                label,
                &format!(r#"<input type="text" name="{name}" id="{name}" class="{INPUT}"{}>"#, req(required)),
            ),
            Field::TextArea { name, label, required } => labelled(
                name,
                label,
                &format!(r#"<textarea name="{name}" id="{name}" rows="3" class="{INPUT}"{}></textarea>"#, req(required)),
            ),
            Field::Number { name, label, required } => labelled(
                name,
                label,
                &format!(r#"<input type="number" step="0.01" name="{name}" id="{name}" class="{INPUT}"{}>"#, req(required)),
            ),
            Field::Date { name, label } => labelled(
                name,
                label,
                &format!(r#"<input type="date" name="{name}" id="{name}" class="{INPUT}">"#),
            ),
            Field::Select { name, label, options } => {
                let options_html: String = options
                    .iter()
                    .map(|(value, text)| format!(r#"<option value="{}">{}</option>"#, escape(value), escape(text)))
                    .collect();
                labelled(
                    name,
                    label,
                    &format!(r#"<select name="{name}" id="{name}" class="{INPUT}">{options_html}</select>"#),
                )
            }
            Field::Checkbox { name, label, checked } => format!(
                r#"<label class="flex items-center gap-2 text-sm text-gray-700"><input type="checkbox" name="{name}" value="true"{}> {label}</label>"#,
                if *checked { " checked" } else { "" }
            ),
        }
    }
}

fn labelled(name: &str, label: &str, control: &str) -> String {
    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700">{label}</label>
            {control}
        </div>"##
    )
}

/// Collapsible create form posting to the JSON API through HTMX.
pub fn create_form(action: &str, button: &str, fields: &[Field<'_>]) -> String {
    let fields_html: String = fields.iter().map(Field::render).collect();
    format!(
        r##"<div x-data="{{ open: false }}" class="bg-white rounded-xl shadow-sm border border-gray-200">
            <button type="button" @click="open = !open" class="w-full flex items-center justify-between px-6 py-4 text-left font-medium text-gray-900">
                <span><i class="fas fa-plus mr-2 text-primary-600"></i>{button}</span>
                <i class="fas" :class="open ? 'fa-chevron-up' : 'fa-chevron-down'"></i>
            </button>
            <form x-show="open" x-cloak hx-post="{action}" class="px-6 pb-6 grid gap-4 md:grid-cols-2">
                {fields_html}
                <div class="md:col-span-2 flex justify-end">
                    <button type="submit" class="bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">Salvar</button>
                </div>
            </form>
        </div>"##
    )
}

/// Delete button calling `DELETE {action}` after confirmation.
pub fn delete_button(action: &str) -> String {
    format!(
        r##"<button hx-delete="{action}" hx-confirm="Confirma a exclusão?" class="text-red-600 hover:text-red-800" title="Excluir">
            <i class="fas fa-trash"></i>
        </button>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b>"Silva" & Filhos</b>"#), "&lt;b&gt;&quot;Silva&quot; &amp; Filhos&lt;/b&gt;");
    }

    #[test]
    fn create_form_posts_to_api() {
        let html = create_form(
            "/api/clients",
            "Novo cliente",
            &[
                Field::Text { name: "name", label: "Nome", required: true },
                Field::Select {
                    name: "type",
                    label: "Tipo",
                    options: vec![("individual".into(), "Pessoa física".into())],
                },
            ],
        );
        assert!(html.contains(r#"hx-post="/api/clients""#));
        assert!(html.contains(r#"name="name" id="name""#));
        assert!(html.contains(r#"<option value="individual">Pessoa física</option>"#));
    }
}

use std::{env, fs};

use mailtpl::{MailConfig, MailService, Variables};
use tempfile::tempdir;

const WELCOME: &str = r#"subject = "Welcome {{ user }}"
body = '''
<mail>
  <from name="Acme">noreply@acme.org</from>
  <to name="{{ user | entity }}">{{ email }}</to>
  <message type="plain">{{ greeting }}</message>
  <message type="html"><![CDATA[
    <img src="cid:{{ embed.image("logo.png") }}" alt="{{ embed.name("logo.png") }}">
    <p>{{ greeting }}</p>
  ]]></message>
</mail>
'''

[snippets]
greeting = "Hello {{ user | entity }}, welcome aboard!"
"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = tempdir().unwrap();
    let templates_dir = dir.path().join("templates");
    let resource_dir = dir.path().join("resources");
    fs::create_dir_all(&templates_dir).unwrap();
    fs::create_dir_all(&resource_dir).unwrap();
    fs::write(templates_dir.join("welcome.toml"), WELCOME).unwrap();
    fs::write(resource_dir.join("logo.png"), b"\x89PNG\r\n\x1a\n").unwrap();

    let service = MailService::new(MailConfig {
        templates_dir,
        resource_dir,
        ..Default::default()
    });

    let user = env::args().nth(1).unwrap_or_else(|| String::from("Alice"));
    let vars = Variables::new()
        .with("email", format!("{}@localhost", user.to_lowercase()))
        .with("user", user);

    let email = service.render("welcome", None, vars).unwrap();
    let mime = email.write_to_string().unwrap();

    println!("================================");
    println!("TEMPLATE");
    println!("================================");
    println!();
    println!("{WELCOME}");

    println!("================================");
    println!("RENDERED MIME MESSAGE");
    println!("================================");
    println!();
    println!("{mime}");
}

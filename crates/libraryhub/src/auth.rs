use crate::client::{ApiClient, RequestOptions};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use serde_json::Value;

pub use libraryhub_core::auth::{
    AvatarChangeRequest, LoginRequest, NewAdminRequest, PasswordChangeRequest, SignUpRequest,
    UserIdentity, UserProfile, VerificationCodeRequest,
};

/// Authentication and account commands
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Fetch a fresh CSRF token
    #[clap(name = "csrf-token")]
    CsrfToken,

    /// Log in with username and password
    #[clap(name = "login")]
    Login(LoginOptions),

    /// Create an account (needs an email verification code)
    #[clap(name = "register")]
    Register(RegisterOptions),

    /// Email a verification code for registration
    #[clap(name = "send-code")]
    SendCode(SendCodeOptions),

    /// End the current session
    #[clap(name = "logout")]
    Logout,

    /// Show the logged-in user's profile
    #[clap(name = "whoami")]
    Whoami(WhoamiOptions),

    /// Change the password
    #[clap(name = "password")]
    Password(PasswordOptions),

    /// Change the avatar URL
    #[clap(name = "avatar")]
    Avatar(AvatarOptions),

    /// Create an administrator account (administrators only)
    #[clap(name = "new-admin")]
    NewAdmin(NewAdminOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct LoginOptions {
    #[clap(env = "LIBRARYHUB_USERNAME")]
    pub username: String,

    #[arg(long, env = "LIBRARYHUB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct RegisterOptions {
    pub username: String,

    #[arg(long)]
    pub email: String,

    /// Code received via `send-code`
    #[arg(long)]
    pub code: String,

    #[arg(long, env = "LIBRARYHUB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct SendCodeOptions {
    pub email: String,
}

#[derive(Debug, clap::Args, Clone)]
pub struct WhoamiOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PasswordOptions {
    #[arg(long, hide_env_values = true, env = "LIBRARYHUB_OLD_PASSWORD")]
    pub old: String,

    #[arg(long, hide_env_values = true, env = "LIBRARYHUB_NEW_PASSWORD")]
    pub new: String,
}

#[derive(Debug, clap::Args, Clone)]
pub struct AvatarOptions {
    /// Public URL of the new avatar image
    pub url: String,
}

#[derive(Debug, clap::Args, Clone)]
pub struct NewAdminOptions {
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, hide_env_values = true, env = "LIBRARYHUB_ADMIN_PASSWORD")]
    pub password: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Grant root privileges
    #[arg(long)]
    pub root: bool,
}

// --- Data functions ---

/// Fetch a token from the backend and store it in the session.
pub async fn csrf_token_data(client: &ApiClient) -> Result<String> {
    Ok(client.refresh_csrf_token().await?)
}

/// Log in; the returned user becomes the session user.
pub async fn login_data(client: &ApiClient, request: &LoginRequest) -> Result<UserIdentity> {
    let user: UserIdentity = client
        .post("/auth/login", request, &RequestOptions::new())
        .await?
        .ok_or_eyre("Login succeeded but the backend returned no user")?;

    client.session().set_user(Some(user.clone()));
    Ok(user)
}

/// Register; the backend logs the new user in directly.
pub async fn register_data(client: &ApiClient, request: &SignUpRequest) -> Result<Option<UserIdentity>> {
    let user: Option<UserIdentity> = client
        .post("/auth/register", request, &RequestOptions::new())
        .await?;

    if let Some(user) = &user {
        client.session().set_user(Some(user.clone()));
    }
    Ok(user)
}

pub async fn send_code_data(client: &ApiClient, email: &str) -> Result<()> {
    let request = VerificationCodeRequest {
        email: email.trim().to_string(),
    };
    if request.email.is_empty() {
        return Err(eyre!("Email cannot be empty"));
    }

    client
        .post::<Value, _>("/auth/send-verification-code", &request, &RequestOptions::new())
        .await?;
    Ok(())
}

/// Log out. The session is only cleared once the backend accepted the call.
pub async fn logout_data(client: &ApiClient) -> Result<()> {
    client
        .post::<Value, _>("/auth/logout", &serde_json::json!({}), &RequestOptions::new())
        .await?;

    client.session().clear_auth();
    Ok(())
}

/// Current user's profile; refreshes the session user.
pub async fn whoami_data(client: &ApiClient) -> Result<UserProfile> {
    let profile: UserProfile = client
        .get("/auth/user", &RequestOptions::new())
        .await?
        .ok_or_eyre("Not logged in")?;

    client.session().set_user(Some(profile.clone().into()));
    Ok(profile)
}

pub async fn password_data(client: &ApiClient, request: &PasswordChangeRequest) -> Result<()> {
    if request.new_password.trim().is_empty() {
        return Err(eyre!("New password cannot be empty"));
    }

    client
        .post::<Value, _>("/auth/password", request, &RequestOptions::new())
        .await?;
    Ok(())
}

/// Change the avatar and mirror it into the session user.
pub async fn avatar_data(client: &ApiClient, url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(eyre!("Avatar URL cannot be empty"));
    }

    let request = AvatarChangeRequest {
        avatar: url.to_string(),
    };
    client
        .post::<Value, _>("/auth/avatar", &request, &RequestOptions::new())
        .await?;

    if let Some(mut user) = client.session().user() {
        user.avatar = Some(url.to_string());
        client.session().set_user(Some(user));
    }
    Ok(())
}

/// Create an administrator. The caller must be an administrator.
pub async fn new_admin_data(client: &ApiClient, request: &NewAdminRequest) -> Result<()> {
    request.validate().map_err(|e| eyre!(e))?;

    if client.session().user().is_none() {
        whoami_data(client).await?;
    }
    if !client.session().snapshot().is_admin() {
        return Err(eyre!("Only administrators can create admin accounts"));
    }

    client
        .post::<Value, _>("/auth/new/admin", request, &RequestOptions::new())
        .await?;
    Ok(())
}

// --- CLI handlers ---

fn print_user(user: &UserIdentity) {
    println!("{} {}", "Logged in as".green().bold(), user.username.bright_white());
    if let Some(role) = &user.role {
        println!("  {} {}", "Role:".bold(), role);
    }
}

async fn login_handler(client: &ApiClient, options: LoginOptions) -> Result<()> {
    let request = LoginRequest {
        username: options.username,
        password: options.password,
    };
    let user = login_data(client, &request).await?;

    if options.json {
        print_json(&user)?;
    } else {
        print_user(&user);
    }
    Ok(())
}

async fn register_handler(client: &ApiClient, options: RegisterOptions) -> Result<()> {
    let request = SignUpRequest {
        username: options.username,
        email: options.email,
        email_verification_code: options.code,
        password: options.password,
    };
    let user = register_data(client, &request).await?;

    if options.json {
        print_json(&user)?;
    } else {
        match user {
            Some(user) => print_user(&user),
            None => println!("{}", "Account created.".green().bold()),
        }
    }
    Ok(())
}

async fn whoami_handler(client: &ApiClient, options: WhoamiOptions) -> Result<()> {
    let profile = whoami_data(client).await?;

    if options.json {
        return print_json(&profile);
    }

    let mut table = new_table(&["Field", "Value"]);
    let na = || "N/A".to_string();
    table.add_row(prettytable::row!["ID", profile.id]);
    table.add_row(prettytable::row!["Username", profile.username.bright_white()]);
    table.add_row(prettytable::row!["Email", profile.email.clone().unwrap_or_else(na)]);
    table.add_row(prettytable::row!["Phone", profile.phone.clone().unwrap_or_else(na)]);
    table.add_row(prettytable::row!["Avatar", profile.avatar.clone().unwrap_or_else(na)]);
    table.add_row(prettytable::row!["Role", profile.role.clone().unwrap_or_else(na)]);
    table.printstd();
    Ok(())
}

/// Run auth commands
pub async fn run(cmd: Commands, client: &ApiClient, global: &crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running auth command against {}...", client.base_url());
    }

    match cmd {
        Commands::CsrfToken => {
            let token = csrf_token_data(client).await?;
            println!("{token}");
        }
        Commands::Login(options) => login_handler(client, options).await?,
        Commands::Register(options) => register_handler(client, options).await?,
        Commands::SendCode(options) => {
            send_code_data(client, &options.email).await?;
            println!("{} {}", "Verification code sent to".green(), options.email);
        }
        Commands::Logout => {
            logout_data(client).await?;
            println!("{}", "Logged out.".green().bold());
        }
        Commands::Whoami(options) => whoami_handler(client, options).await?,
        Commands::Password(options) => {
            let request = PasswordChangeRequest {
                old_password: options.old,
                new_password: options.new,
            };
            password_data(client, &request).await?;
            println!("{}", "Password changed.".green().bold());
        }
        Commands::Avatar(options) => {
            avatar_data(client, &options.url).await?;
            println!("{}", "Avatar updated.".green().bold());
        }
        Commands::NewAdmin(options) => {
            let request = NewAdminRequest {
                email: options.email,
                is_root: options.root,
                password: options.password,
                phone: options.phone,
                username: options.username,
            };
            new_admin_data(client, &request).await?;
            println!(
                "{} {}",
                "Administrator created:".green().bold(),
                request.username.bright_white()
            );
        }
    }

    Ok(())
}

//! Typed handlers for every user action, independent of how the UI is drawn.
//!
//! Each handler validates its input locally, talks to the API through [`ApiClient`] and
//! feeds the result into the [`ProductListController`]. The active [`View`] tells the front
//! end which form or table to show.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::validation::{self, LoginForm, SignupForm, ValidationError};
use crate::client::{ApiClient, ClientError};
use crate::controller::{PageView, ProductListController};
use crate::model::{self, CurrentUser, Product, ProductDraft, ProductPatch};
use crate::store::{RememberStore, Remembered};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created! Please login.";
pub const TRANSPORT_ERROR_MESSAGE: &str = "Unable to reach the server";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Login,
    Signup,
    Dashboard,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("product {id} not found")]
    UnknownProduct { id: i64 },
}

impl DashboardError {
    /// Text for the alert banner shown next to the form that failed.
    pub fn banner(&self) -> String {
        match self {
            Self::Validation(e) => e.message.clone(),
            Self::Client(ClientError::Request { message, .. }) => message.clone(),
            Self::Client(e) if e.is_transport() => TRANSPORT_ERROR_MESSAGE.to_string(),
            Self::Client(e) => e.to_string(),
            Self::UnknownProduct { .. } => self.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Startup {
    pub view: View,
    pub prefill_username: Option<String>,
    pub products: Option<PageView>,
    /// Banner for a product load that failed after the session was accepted.
    pub load_error: Option<String>,
}

pub struct Dashboard {
    client: ApiClient,
    store: RememberStore,
    products: ProductListController,
    view: View,
    user: Option<CurrentUser>,
    demo: bool,
}

impl Dashboard {
    pub fn new(client: ApiClient, store: RememberStore) -> Self {
        Self {
            client: client.with_store(store.clone()),
            store,
            products: ProductListController::default(),
            view: View::Login,
            user: None,
            demo: false,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn show_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn products(&self) -> &ProductListController {
        &self.products
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn remembered_username(&self) -> Option<String> {
        self.load_remembered().remembered_username
    }

    fn load_remembered(&self) -> Remembered {
        self.store.load().unwrap_or_else(|e| {
            warn!(
                error = %e,
                path = %self.store.path().display(),
                "ignoring unreadable store"
            );
            Remembered::default()
        })
    }

    /// Seeds the client with the stored session cookie and returns the remembered
    /// username for the login prefill.
    pub fn restore_session(&mut self) -> Option<String> {
        let remembered = self.load_remembered();
        if let Some(token) = remembered.session_token.as_deref() {
            self.client.restore_session(token);
        }
        remembered.remembered_username
    }

    /// Restores the stored session and decides which view to open.
    pub async fn start(&mut self) -> Startup {
        let prefill_username = self.restore_session();

        let mut load_error = None;
        let products = match self.check_auth().await {
            Ok(true) => match self.load_products().await {
                Ok(view) => Some(view),
                Err(e) => {
                    warn!(error = %e, "failed to load products");
                    load_error = Some(e.banner());
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                debug!(error = %e, "auth check failed, showing login");
                None
            }
        };

        Startup {
            view: self.view,
            prefill_username,
            products,
            load_error,
        }
    }

    /// Asks the API who is signed in. Any failure lands on the login view.
    pub async fn check_auth(&mut self) -> Result<bool, DashboardError> {
        match self.client.get_current_user().await {
            Ok(user) if user.is_authenticated() => {
                self.user = Some(user);
                self.view = View::Dashboard;
                Ok(true)
            }
            Ok(_) => {
                self.user = None;
                self.view = View::Login;
                Ok(false)
            }
            Err(e) => {
                self.user = None;
                self.view = View::Login;
                Err(e.into())
            }
        }
    }

    pub async fn whoami(&mut self) -> Result<Option<CurrentUser>, DashboardError> {
        self.check_auth().await?;
        Ok(self.user.clone())
    }

    pub async fn login(&mut self, form: LoginForm) -> Result<String, DashboardError> {
        let credentials = validation::validate_login(&form)?;
        let response = self.client.login(&credentials).await?;

        self.persist_session(&credentials.username, form.remember_me);
        self.demo = false;
        self.view = View::Dashboard;
        if let Err(e) = self.load_products().await {
            warn!(error = %e, "failed to load products after login");
        }

        Ok(response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| LOGIN_SUCCESS_MESSAGE.to_string()))
    }

    fn persist_session(&self, username: &str, remember_me: bool) {
        let state = Remembered {
            remembered_username: remember_me.then(|| username.to_string()),
            session_token: self.client.session_token(),
        };
        if let Err(e) = self.store.save(&state) {
            warn!(error = %e, "failed to persist session");
        }
    }

    pub async fn signup(&mut self, form: SignupForm) -> Result<String, DashboardError> {
        let credentials = validation::validate_signup(&form)?;
        self.client.signup(&credentials).await?;
        info!(username = %credentials.username, "account created");
        self.view = View::Login;
        Ok(SIGNUP_SUCCESS_MESSAGE.to_string())
    }

    /// The remembered data is cleared even when this fails; the view only changes once the
    /// server confirms. Demo sessions never reach the server.
    pub async fn logout(&mut self) -> Result<(), DashboardError> {
        if self.demo {
            if let Err(e) = self.store.forget() {
                warn!(error = %e, "failed to clear remembered session");
            }
            self.reset();
            return Ok(());
        }
        match self.client.logout().await {
            Ok(()) => {
                self.reset();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "logout failed");
                Err(e.into())
            }
        }
    }

    fn reset(&mut self) {
        self.products.clear();
        self.user = None;
        self.demo = false;
        self.view = View::Login;
    }

    /// Seeds the list with the demo catalogue. No request is made and later mutations
    /// are applied locally.
    pub fn load_demo(&mut self) -> PageView {
        self.demo = true;
        self.view = View::Dashboard;
        self.products.replace_all(model::demo_products())
    }

    pub async fn load_products(&mut self) -> Result<PageView, DashboardError> {
        if self.demo {
            return Ok(self.products.render());
        }
        let products = self.client.get_products().await?;
        debug!(count = products.len(), "products loaded");
        Ok(self.products.replace_all(products))
    }

    pub async fn create_product(
        &mut self,
        draft: ProductDraft,
    ) -> Result<PageView, DashboardError> {
        validation::validate_draft(&draft)?;
        if self.demo {
            let next_id = self.products.all().iter().map(|p| p.id).max().unwrap_or(0) + 1;
            let mut all = self.products.all().to_vec();
            all.push(Product {
                id: next_id,
                name: draft.name,
                description: draft.description,
                unit_price: draft.unit_price,
                quantity: draft.quantity,
                delivery_fee: draft.delivery_fee,
                owner_id: Some(1),
                target_margin: draft.target_margin,
            });
            return Ok(self.products.replace_all(all));
        }
        self.client.create_product(&draft).await?;
        info!(name = %draft.name, "product created");
        self.load_products().await
    }

    pub async fn update_product(
        &mut self,
        id: i64,
        patch: ProductPatch,
    ) -> Result<PageView, DashboardError> {
        validation::validate_patch(&patch)?;
        if self.demo {
            let mut all = self.products.all().to_vec();
            let product = all
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(DashboardError::UnknownProduct { id })?;
            apply_patch(product, patch);
            return Ok(self.products.replace_all(all));
        }
        self.client.update_product(id, &patch).await?;
        info!(id, "product updated");
        self.load_products().await
    }

    pub async fn delete_product(&mut self, id: i64) -> Result<PageView, DashboardError> {
        if self.demo {
            if self.products.find(id).is_none() {
                return Err(DashboardError::UnknownProduct { id });
            }
            let all = self
                .products
                .all()
                .iter()
                .filter(|p| p.id != id)
                .cloned()
                .collect();
            return Ok(self.products.replace_all(all));
        }
        self.client.delete_product(id).await?;
        info!(id, "product deleted");
        self.load_products().await
    }

    pub fn search(&mut self, term: &str) -> PageView {
        self.products.set_search_term(term)
    }

    pub fn change_page(&mut self, delta: i64) -> Option<PageView> {
        self.products.set_page(delta)
    }

    pub fn go_to_page(&mut self, page: usize) -> Option<PageView> {
        self.products.go_to_page(page)
    }

    pub fn page_view(&self) -> PageView {
        self.products.render()
    }
}

fn apply_patch(product: &mut Product, patch: ProductPatch) {
    if let Some(name) = patch.name {
        product.name = name;
    }
    if let Some(description) = patch.description {
        product.description = Some(description);
    }
    if let Some(price) = patch.unit_price {
        product.unit_price = price;
    }
    if let Some(quantity) = patch.quantity {
        product.quantity = quantity;
    }
    if let Some(fee) = patch.delivery_fee {
        product.delivery_fee = fee;
    }
    if let Some(margin) = patch.target_margin {
        product.target_margin = margin;
    }
}

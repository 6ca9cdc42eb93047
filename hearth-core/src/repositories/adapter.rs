//! Adapters that wrap a [`RepositoryProvider`] and implement the
//! individual repository traits, so services can stay generic over a
//! single provider type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    Error, User, UserId,
    lockout::LoginAttempt,
    notification::{Notification, NotificationId, NotificationRecipient, NotificationStatus},
    promotion::{PromotionId, PromotionRequest, PromotionStatus},
    property::{Property, PropertyId, PropertyStatus, PropertyType},
    repositories::{
        LockoutRepository, LockoutRepositoryProvider, NotificationRepository,
        NotificationRepositoryProvider, Page, PageRequest, PasswordRepository,
        PasswordRepositoryProvider, PromotionRepository, PromotionRepositoryProvider,
        PropertyFilter, PropertyRepository, PropertyRepositoryProvider, RepositoryProvider,
        SessionRepository, SessionRepositoryProvider, SettingsRepository,
        SettingsRepositoryProvider, SubscriptionRepository, SubscriptionRepositoryProvider,
        SupportRepository, SupportRepositoryProvider, UserRepository, UserRepositoryProvider,
        VendorRepository, VendorRepositoryProvider,
    },
    session::{Session, SessionToken},
    settings::{HeroSettings, Settings},
    subscription::{Addon, Subscription, SubscriptionId, SubscriptionPlan, SubscriptionStatus},
    support::{SupportTicket, TicketId, TicketReply, TicketStatus},
    user::NewUser,
    vendor::{
        BookingId, BookingStatus, NewReview, Review, ServiceBooking, ServiceStatistics,
        VendorService, VendorServiceId,
    },
};

macro_rules! provider_adapter {
    ($adapter:ident) => {
        pub struct $adapter<R: RepositoryProvider> {
            provider: Arc<R>,
        }

        impl<R: RepositoryProvider> $adapter<R> {
            pub fn new(provider: Arc<R>) -> Self {
                Self { provider }
            }
        }
    };
}

provider_adapter!(UserRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_email(email).await
    }

    async fn find_or_create_by_email(&self, email: &str) -> Result<User, Error> {
        self.provider.user().find_or_create_by_email(email).await
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        self.provider.user().update(user).await
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.provider.user().delete(id).await
    }

    async fn mark_email_verified(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.user().mark_email_verified(user_id).await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>, Error> {
        self.provider.user().list(page).await
    }
}

provider_adapter!(SessionRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: &Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.session().delete_for_user(user_id).await
    }

    async fn delete_expired(&self) -> Result<u64, Error> {
        self.provider.session().delete_expired().await
    }
}

provider_adapter!(PasswordRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider
            .password()
            .set_password_hash(user_id, hash)
            .await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.password().remove_password_hash(user_id).await
    }
}

provider_adapter!(LockoutRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> LockoutRepository for LockoutRepositoryAdapter<R> {
    async fn find(&self, email: &str, ip_address: &str) -> Result<Option<LoginAttempt>, Error> {
        self.provider.lockout().find(email, ip_address).await
    }

    async fn record_failure(
        &self,
        email: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginAttempt, Error> {
        self.provider
            .lockout()
            .record_failure(email, ip_address, user_agent)
            .await
    }

    async fn lock(
        &self,
        email: &str,
        ip_address: &str,
        locked_until: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider
            .lockout()
            .lock(email, ip_address, locked_until)
            .await
    }

    async fn reset(&self, email: &str, ip_address: &str) -> Result<(), Error> {
        self.provider.lockout().reset(email, ip_address).await
    }

    async fn cleanup_stale(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.lockout().cleanup_stale(before).await
    }
}

provider_adapter!(NotificationRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> NotificationRepository for NotificationRepositoryAdapter<R> {
    async fn create(&self, notification: &Notification) -> Result<Notification, Error> {
        self.provider.notification().create(notification).await
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, Error> {
        self.provider.notification().find_by_id(id).await
    }

    async fn update(&self, notification: &Notification) -> Result<Notification, Error> {
        self.provider.notification().update(notification).await
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        self.provider.notification().delete(id).await
    }

    async fn add_recipients(
        &self,
        id: &NotificationId,
        recipients: &[NotificationRecipient],
    ) -> Result<(), Error> {
        self.provider
            .notification()
            .add_recipients(id, recipients)
            .await
    }

    async fn mark_delivered(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider
            .notification()
            .mark_delivered(id, user_id, at)
            .await
    }

    async fn mark_opened(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider
            .notification()
            .mark_opened(id, user_id, at)
            .await
    }

    async fn mark_clicked(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider
            .notification()
            .mark_clicked(id, user_id, at)
            .await
    }

    async fn update_statistics(&self, notification: &Notification) -> Result<(), Error> {
        self.provider
            .notification()
            .update_statistics(notification)
            .await
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        status: NotificationStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        self.provider
            .notification()
            .update_status(id, status, sent_at)
            .await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Notification>, Error> {
        self.provider.notification().list(page).await
    }
}

provider_adapter!(PropertyRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> PropertyRepository for PropertyRepositoryAdapter<R> {
    async fn create(&self, property: &Property) -> Result<Property, Error> {
        self.provider.property().create(property).await
    }

    async fn find_by_id(&self, id: &PropertyId) -> Result<Option<Property>, Error> {
        self.provider.property().find_by_id(id).await
    }

    async fn update(&self, property: &Property) -> Result<Property, Error> {
        self.provider.property().update(property).await
    }

    async fn delete(&self, id: &PropertyId) -> Result<(), Error> {
        self.provider.property().delete(id).await
    }

    async fn update_status(&self, id: &PropertyId, status: PropertyStatus) -> Result<(), Error> {
        self.provider.property().update_status(id, status).await
    }

    async fn list(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Page<Property>, Error> {
        self.provider.property().list(filter, page).await
    }

    async fn count_for_owner(
        &self,
        owner_id: &UserId,
        status: PropertyStatus,
    ) -> Result<u64, Error> {
        self.provider
            .property()
            .count_for_owner(owner_id, status)
            .await
    }

    async fn upsert_type(&self, property_type: &PropertyType) -> Result<(), Error> {
        self.provider.property().upsert_type(property_type).await
    }

    async fn find_type(&self, key: &str) -> Result<Option<PropertyType>, Error> {
        self.provider.property().find_type(key).await
    }

    async fn list_types(&self) -> Result<Vec<PropertyType>, Error> {
        self.provider.property().list_types().await
    }

    async fn delete_type(&self, key: &str) -> Result<(), Error> {
        self.provider.property().delete_type(key).await
    }
}

provider_adapter!(SubscriptionRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> SubscriptionRepository for SubscriptionRepositoryAdapter<R> {
    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> Result<(), Error> {
        self.provider.subscription().upsert_plan(plan).await
    }

    async fn find_plan(&self, key: &str) -> Result<Option<SubscriptionPlan>, Error> {
        self.provider.subscription().find_plan(key).await
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, Error> {
        self.provider.subscription().list_plans().await
    }

    async fn upsert_addon(&self, addon: &Addon) -> Result<(), Error> {
        self.provider.subscription().upsert_addon(addon).await
    }

    async fn find_addon(&self, key: &str) -> Result<Option<Addon>, Error> {
        self.provider.subscription().find_addon(key).await
    }

    async fn list_addons(&self) -> Result<Vec<Addon>, Error> {
        self.provider.subscription().list_addons().await
    }

    async fn create(&self, subscription: &Subscription) -> Result<Subscription, Error> {
        self.provider.subscription().create(subscription).await
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, Error> {
        self.provider.subscription().find_by_id(id).await
    }

    async fn find_current_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, Error> {
        self.provider
            .subscription()
            .find_current_for_user(user_id)
            .await
    }

    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), Error> {
        self.provider.subscription().update_status(id, status).await
    }

    async fn set_addons(&self, id: &SubscriptionId, addons: &[String]) -> Result<(), Error> {
        self.provider.subscription().set_addons(id, addons).await
    }
}

provider_adapter!(SupportRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> SupportRepository for SupportRepositoryAdapter<R> {
    async fn create(&self, ticket: &SupportTicket) -> Result<SupportTicket, Error> {
        self.provider.support().create(ticket).await
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<SupportTicket>, Error> {
        self.provider.support().find_by_id(id).await
    }

    async fn update_status(&self, id: &TicketId, status: TicketStatus) -> Result<(), Error> {
        self.provider.support().update_status(id, status).await
    }

    async fn add_reply(
        &self,
        id: &TicketId,
        author_id: &UserId,
        staff: bool,
        body: &str,
    ) -> Result<TicketReply, Error> {
        self.provider
            .support()
            .add_reply(id, author_id, staff, body)
            .await
    }

    async fn list_replies(&self, id: &TicketId) -> Result<Vec<TicketReply>, Error> {
        self.provider.support().list_replies(id).await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<SupportTicket>, Error> {
        self.provider.support().list(page).await
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SupportTicket>, Error> {
        self.provider.support().list_for_user(user_id, page).await
    }
}

provider_adapter!(VendorRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> VendorRepository for VendorRepositoryAdapter<R> {
    async fn create_service(&self, service: &VendorService) -> Result<VendorService, Error> {
        self.provider.vendor().create_service(service).await
    }

    async fn find_service(&self, id: &VendorServiceId) -> Result<Option<VendorService>, Error> {
        self.provider.vendor().find_service(id).await
    }

    async fn update_service(&self, service: &VendorService) -> Result<VendorService, Error> {
        self.provider.vendor().update_service(service).await
    }

    async fn delete_service(&self, id: &VendorServiceId) -> Result<(), Error> {
        self.provider.vendor().delete_service(id).await
    }

    async fn list_services(&self, page: PageRequest) -> Result<Page<VendorService>, Error> {
        self.provider.vendor().list_services(page).await
    }

    async fn create_booking(&self, booking: &ServiceBooking) -> Result<ServiceBooking, Error> {
        self.provider.vendor().create_booking(booking).await
    }

    async fn find_booking(&self, id: &BookingId) -> Result<Option<ServiceBooking>, Error> {
        self.provider.vendor().find_booking(id).await
    }

    async fn update_booking_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<(), Error> {
        self.provider
            .vendor()
            .update_booking_status(id, status)
            .await
    }

    async fn list_bookings(&self, id: &VendorServiceId) -> Result<Vec<ServiceBooking>, Error> {
        self.provider.vendor().list_bookings(id).await
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, Error> {
        self.provider.vendor().create_review(review).await
    }

    async fn list_reviews(&self, id: &VendorServiceId) -> Result<Vec<Review>, Error> {
        self.provider.vendor().list_reviews(id).await
    }

    async fn update_statistics(
        &self,
        id: &VendorServiceId,
        statistics: &ServiceStatistics,
    ) -> Result<(), Error> {
        self.provider
            .vendor()
            .update_statistics(id, statistics)
            .await
    }
}

provider_adapter!(SettingsRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> SettingsRepository for SettingsRepositoryAdapter<R> {
    async fn get_or_create(&self) -> Result<Settings, Error> {
        self.provider.settings().get_or_create().await
    }

    async fn update(&self, settings: &Settings) -> Result<Settings, Error> {
        self.provider.settings().update(settings).await
    }

    async fn get_or_create_hero(&self) -> Result<HeroSettings, Error> {
        self.provider.settings().get_or_create_hero().await
    }

    async fn update_hero(&self, hero: &HeroSettings) -> Result<HeroSettings, Error> {
        self.provider.settings().update_hero(hero).await
    }
}

provider_adapter!(PromotionRepositoryAdapter);

#[async_trait]
impl<R: RepositoryProvider> PromotionRepository for PromotionRepositoryAdapter<R> {
    async fn create(&self, request: &PromotionRequest) -> Result<PromotionRequest, Error> {
        self.provider.promotion().create(request).await
    }

    async fn find_by_id(&self, id: &PromotionId) -> Result<Option<PromotionRequest>, Error> {
        self.provider.promotion().find_by_id(id).await
    }

    async fn update_status(&self, id: &PromotionId, status: PromotionStatus) -> Result<(), Error> {
        self.provider.promotion().update_status(id, status).await
    }

    async fn list_by_status(
        &self,
        status: PromotionStatus,
        page: PageRequest,
    ) -> Result<Page<PromotionRequest>, Error> {
        self.provider
            .promotion()
            .list_by_status(status, page)
            .await
    }

    async fn list_for_property(&self, id: &PropertyId) -> Result<Vec<PromotionRequest>, Error> {
        self.provider.promotion().list_for_property(id).await
    }
}

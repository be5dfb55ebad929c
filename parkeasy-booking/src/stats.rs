use chrono::{DateTime, Utc};
use parkeasy_core::{
    BookingFilter, BookingStatus, CoreResult, ParkingStore, PaymentStatus, SlotStatus, UserRole,
};
use serde::Serialize;
use uuid::Uuid;

const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct UserCounters {
    pub total: usize,
    pub new_today: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LotCounters {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotCounters {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    /// Percentage of slots in the `occupied` state, two decimals.
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingCounters {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub today: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueCounters {
    pub total: f64,
    pub today: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub id: Uuid,
    pub user_name: String,
    pub lot_name: String,
    pub status: BookingStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

/// Admin dashboard snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeStats {
    pub users: UserCounters,
    pub parking_lots: LotCounters,
    pub slots: SlotCounters,
    pub bookings: BookingCounters,
    pub revenue: RevenueCounters,
    pub recent_activities: Vec<RecentActivity>,
    pub last_updated: DateTime<Utc>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub async fn realtime_stats(store: &dyn ParkingStore) -> CoreResult<RealtimeStats> {
    let now = Utc::now();
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);

    let users = store.list_users().await?;
    let customers: Vec<_> = users.iter().filter(|u| u.role == UserRole::User).collect();
    let user_counters = UserCounters {
        total: customers.len(),
        new_today: customers.iter().filter(|u| u.created_at >= today_start).count(),
    };

    let lots = store.list_lots(None).await?;
    let lot_counters = LotCounters {
        total: lots.len(),
        active: lots.iter().filter(|l| l.is_active).count(),
    };

    let (mut total_slots, mut available, mut occupied) = (0usize, 0usize, 0usize);
    for lot in &lots {
        for slot in store.list_slots(lot.id, None).await? {
            total_slots += 1;
            match slot.status {
                SlotStatus::Available => available += 1,
                SlotStatus::Occupied => occupied += 1,
                _ => {}
            }
        }
    }
    let occupancy_rate = if total_slots > 0 {
        round2(occupied as f64 / total_slots as f64 * 100.0)
    } else {
        0.0
    };

    // newest first
    let bookings = store.list_bookings(&BookingFilter::default()).await?;
    let booking_counters = BookingCounters {
        total: bookings.len(),
        active: bookings.iter().filter(|b| BookingStatus::ACTIVE.contains(&b.status)).count(),
        completed: bookings.iter().filter(|b| b.status == BookingStatus::Completed).count(),
        today: bookings.iter().filter(|b| b.created_at >= today_start).count(),
    };

    let paid = bookings.iter().filter(|b| b.payment_status == PaymentStatus::Paid);
    let revenue = RevenueCounters {
        total: round2(paid.clone().map(|b| b.total_price).sum()),
        today: round2(
            paid.filter(|b| b.created_at >= today_start)
                .map(|b| b.total_price)
                .sum(),
        ),
    };

    let mut recent_activities = Vec::with_capacity(RECENT_ACTIVITY_LIMIT);
    for booking in bookings.iter().take(RECENT_ACTIVITY_LIMIT) {
        let user_name = users
            .iter()
            .find(|u| u.id == booking.user_id)
            .map(|u| u.full_name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let lot_name = lots
            .iter()
            .find(|l| l.id == booking.lot_id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        recent_activities.push(RecentActivity {
            id: booking.id,
            user_name,
            lot_name,
            status: booking.status,
            total_price: booking.total_price,
            created_at: booking.created_at,
        });
    }

    Ok(RealtimeStats {
        users: user_counters,
        parking_lots: lot_counters,
        slots: SlotCounters { total: total_slots, available, occupied, occupancy_rate },
        bookings: booking_counters,
        revenue,
        recent_activities,
        last_updated: now,
    })
}

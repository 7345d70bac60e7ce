//! Integration Tests for the Collision Claims Core
//!
//! Cross-crate workflows: intake through estimate, insurance verification,
//! adjuster review, and the scheduling and messaging that follow approval.

use chrono::Utc;
use core_kernel::{Currency, Money, SeededRandom};
use domain_claims::{ClaimStatus, InsuranceInfoStatus, ReviewDecision};
use domain_estimate::{
    analyze_photos, format_ccc_one, generate_pre_estimate, DamageArea, EstimateFormat,
    EstimateGenerator, LineItemType, Photo, PhotoAngle, VehicleUpdate,
};
use rust_decimal_macros::dec;
use test_utils::*;

fn four_corner_photos() -> Vec<Photo> {
    [PhotoAngle::Front, PhotoAngle::Rear, PhotoAngle::DriverSide, PhotoAngle::PassengerSide]
        .into_iter()
        .map(|angle| Photo::new(format!("file:///photos/{}.jpg", angle.label()), Some(angle)))
        .collect()
}

mod camry_scenario {
    use super::*;

    /// Four tagged photos of a 2022 Camry through to a CCC ONE printout
    #[test]
    fn test_photos_to_formatted_estimate() {
        let vehicle = {
            let mut v = VehicleFixtures::incomplete();
            v.merge(VehicleUpdate {
                year: Some(2022),
                make: Some("Toyota".to_string()),
                model: Some("Camry".to_string()),
                ..Default::default()
            });
            v
        };
        vehicle.validate().expect("make and model are set");

        let mut rng = SeededRandom::from_seed(7);
        let assessment = analyze_photos(&four_corner_photos(), &mut rng);

        let areas = assessment.distinct_areas();
        for expected in [
            DamageArea::FrontBumper,
            DamageArea::RearBumper,
            DamageArea::DriverFrontDoor,
            DamageArea::PassengerFrontDoor,
        ] {
            assert!(areas.contains(&expected), "missing {:?} in {:?}", expected, areas);
        }

        let pre = generate_pre_estimate(&assessment);
        assert!(pre.range.low.amount() < pre.range.typical.amount());
        assert!(pre.range.typical.amount() < pre.range.high.amount());
        assert_cost_range_ordered(&pre.range);
        for bound in [pre.range.low, pre.range.typical, pre.range.high] {
            assert_multiple_of(&bound, dec!(50));
        }

        let estimate = EstimateGenerator::with_mock_pricing()
            .generate(&assessment, &vehicle, EstimateFormat::CccOne, &mut rng, TemporalFixtures::now())
            .expect("damage was detected");
        assert!(estimate.total.is_positive());
        for item_type in [LineItemType::Part, LineItemType::Labor, LineItemType::Paint, LineItemType::Supplies] {
            assert!(estimate.items_of(item_type).next().is_some(), "no {:?} line", item_type);
        }
        assert_estimate_balanced(&estimate);

        let text = format_ccc_one(&estimate, &vehicle);
        assert!(text.contains("CCC ONE ESTIMATING SYSTEM"));
        assert!(text.contains("TOTAL:"));
    }

    /// The same flow driven through the claim store
    #[tokio::test]
    async fn test_store_lifecycle_to_approval() {
        let services = TestServices::new();
        let shop = UserFixtures::body_shop();
        let adjuster = UserFixtures::adjuster();
        let mut rng = seeded_rng();

        let claim = services.claims.create_claim(Some(&shop)).await.unwrap();
        services.claims.add_vehicle(claim.id, VehicleFixtures::camry_update()).await.unwrap();
        services.claims.add_photos(claim.id, four_corner_photos()).await.unwrap();

        let analyzing = services.claims.mark_analyzing(claim.id).await.unwrap();
        assert_claim_status(&analyzing, ClaimStatus::Analyzing);

        let assessment = analyze_photos(&analyzing.photos, &mut rng);
        let assessed = services.claims.set_damage_assessment(claim.id, assessment.clone()).await.unwrap();
        assert_claim_status(&assessed, ClaimStatus::PendingReview);
        assert!(assessed.pre_estimate.is_some());

        let estimate = EstimateGenerator::with_mock_pricing()
            .generate(&assessment, &assessed.vehicle, EstimateFormat::Mitchell, &mut rng, Utc::now())
            .unwrap();
        services.claims.set_estimate(claim.id, estimate).await.unwrap();
        let submitted = services.claims.submit_claim(claim.id, &shop).await.unwrap();
        assert!(submitted.is_insurance_locked());

        let approved = services
            .claims
            .review_claim(claim.id, ReviewDecision::Approve, &adjuster, Some(10))
            .await
            .unwrap();
        assert_claim_status(&approved, ClaimStatus::Approved);

        let sent = services.notifier.sent().await;
        assert_notified(&sent, "Claim Submitted");
        let approval = assert_notified(&sent, "Claim Approved");
        assert_eq!(approval.recipient, Some(shop.id));

        let reloaded = services.reopen_claims().get_claim(claim.id).await.unwrap();
        assert_eq!(reloaded, approved);
    }
}

mod insurance_scenario {
    use super::*;

    #[tokio::test]
    async fn test_geico_partial_complete_flagged() {
        let services = TestServices::new();
        let shop = UserFixtures::body_shop();
        let claim = services.claims.create_claim(Some(&shop)).await.unwrap();

        let mut info = domain_claims::InsuranceInfo::new("Geico", "P123");
        let status = services
            .claims
            .update_insurance_info(claim.id, info.clone(), &shop)
            .await
            .unwrap();
        assert_eq!(status, InsuranceInfoStatus::Partial);

        info.agent_name = Some("Jane".to_string());
        let status = services.claims.update_insurance_info(claim.id, info, &shop).await.unwrap();
        assert_eq!(status, InsuranceInfoStatus::Complete);

        let flagged = services
            .claims
            .flag_insurance_info(claim.id, vec!["policy not found with carrier".to_string()])
            .await
            .unwrap();
        assert_eq!(flagged.insurance_info_status, InsuranceInfoStatus::Flagged);
    }

    #[tokio::test]
    async fn test_lock_blocks_every_later_edit() {
        let services = TestServices::new();
        let shop = UserFixtures::body_shop();
        let claim = services.claims.create_claim(Some(&shop)).await.unwrap();

        services
            .claims
            .update_insurance_info(claim.id, InsuranceFixtures::geico_partial(), &shop)
            .await
            .unwrap();
        services.claims.lock_insurance_info(claim.id).await.unwrap();

        let result = services
            .claims
            .update_insurance_info(claim.id, InsuranceFixtures::geico_complete(), &shop)
            .await;
        assert!(matches!(result, Err(domain_claims::ClaimError::Locked(_))));
    }
}

mod fraud_scenario {
    use super::*;
    use domain_claims::{fraud_base_score, FraudRecommendation};
    use domain_estimate::DamageAssessment;

    #[test]
    fn test_low_confidence_high_estimate_scores_45() {
        let assessment = DamageAssessment {
            confidence: 0.5,
            ..DamageFixtures::front_collision()
        };
        let claim = ClaimBuilder::new()
            .with_assessment(assessment)
            .with_estimate(estimate_with_total(
                Money::new(dec!(15000), Currency::USD),
                TemporalFixtures::now(),
            ))
            .build();
        assert!(claim.photos.is_empty());

        let score = fraud_base_score(&claim, TemporalFixtures::now());
        assert_eq!(score, 45);
        assert_eq!(FraudRecommendation::from_score(score), FraudRecommendation::Review);
    }
}

mod after_approval {
    use super::*;
    use domain_scheduling::{AppointmentStatus, AppointmentType, BookingRequest};

    #[tokio::test]
    async fn test_book_drop_off_and_message_customer() {
        let services = TestServices::new();
        let shop = UserFixtures::body_shop();
        let customer = UserFixtures::customer();
        let now = TemporalFixtures::now();

        let claim = services.claims.create_claim(Some(&customer)).await.unwrap();
        services
            .appointments
            .set_schedule(ScheduleFixtures::weekday_shop(shop.id))
            .await
            .unwrap();

        let request = BookingRequest {
            claim_id: claim.id,
            body_shop_id: shop.id,
            customer_id: customer.id,
            date: TemporalFixtures::monday(),
            start: TemporalFixtures::time(9, 0),
            appointment_type: AppointmentType::DropOff,
            loaner_car_request: None,
            delivery_address: None,
            notes: Some("Front bumper and hood".to_string()),
        };
        let appointment = services.appointments.book(request, now).await.unwrap();
        let confirmed = services.appointments.confirm(appointment.id, now).await.unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        let lunch = services
            .appointments
            .available_slots(shop.id, TemporalFixtures::monday())
            .await
            .unwrap();
        assert!(lunch.iter().all(|s| s.slot.start != TemporalFixtures::time(12, 0)));
        assert!(lunch.iter().any(|s| s.slot.start == TemporalFixtures::time(9, 0) && !s.is_available));

        let conversation = services
            .messaging
            .create_conversation(claim.id, vec![shop.id, customer.id], now)
            .await
            .unwrap();
        services
            .messaging
            .send_message(conversation.id, shop.id, "See you Monday at 9.", Vec::new(), now)
            .await
            .unwrap();
        assert_eq!(services.messaging.total_unread(customer.id).await, 1);

        let sent = services.notifier.sent().await;
        assert_notified(&sent, "New Message");
        assert!(sent.iter().any(|n| n.channel == core_kernel::NotificationChannel::Appointments));
    }
}
